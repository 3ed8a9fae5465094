pub mod engine;
pub mod error;
pub mod pipeline;

pub use engine::{DetectionRun, EventDetector, PairOutcome};
pub use error::DetectError;
pub use pipeline::{RunReport, Selection, ThresholdPolicy, Trend, TrendDirection};
