use rankwatch_core::Severity;

fn magnitude_points(change: i64) -> u32 {
    match change.unsigned_abs() {
        0..=4 => 0,
        5..=9 => 10,
        10..=14 => 20,
        15..=19 => 30,
        _ => 40,
    }
}

fn rank_points(current_rank: u32) -> u32 {
    match current_rank {
        0..=5 => 40,
        6..=10 => 30,
        11..=20 => 20,
        21..=30 => 10,
        _ => 0,
    }
}

fn consistency_points(consistency: f64) -> u32 {
    (consistency.clamp(0.0, 1.0) * 20.0).round() as u32
}

/// Score a rank movement on a 0-100 scale.
///
/// Up to 40 points for magnitude, 40 for how high the product now sits and
/// 20 for consistency.
pub fn severity_score(change: i64, current_rank: u32, consistency: f64) -> u32 {
    magnitude_points(change) + rank_points(current_rank) + consistency_points(consistency)
}

pub fn severity_band(score: u32) -> Severity {
    match score {
        80.. => Severity::Critical,
        60..=79 => Severity::High,
        40..=59 => Severity::Medium,
        _ => Severity::Low,
    }
}

pub fn score_severity(change: i64, current_rank: u32, consistency: f64) -> Severity {
    severity_band(severity_score(change, current_rank, consistency))
}
