use super::batch::{Origin, TipBatch};

/// Served when generation is unavailable or untrustworthy.
pub const EMERGENCY_TIPS: [&str; 3] = [
    "🌱 AI environmental wisdom unavailable - check your connection",
    "🤖 Reconnecting to generate fresh climate insights...",
    "🌍 Real-time environmental AI wisdom loading...",
];

/// Shown only when no batch has ever been installed.
pub const LOADING_TIP: &str = "🤖 Generating AI environmental wisdom...";

pub fn emergency_batch(day_tag: &str) -> TipBatch {
    TipBatch::fixed(&EMERGENCY_TIPS, Origin::Emergency, day_tag)
}
