pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod snapshot;
pub mod source;

pub use config::Config;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use snapshot::*;
pub use source::{EventSink, ProductCatalog, SnapshotSource};
