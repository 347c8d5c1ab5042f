use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::gemini::TipGenerator;
use super::parser::{parse_tips, DEFAULT_MAX_TIPS};
use super::prompt::build_prompt;
use crate::core::{EnvironmentalSnapshot, GenerationError};

/// Bounded retry around prompt -> generate -> parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub max_attempts: usize,
    /// An attempt is adopted as soon as it yields at least this many tips
    pub acceptance_bar: usize,
    pub max_tips: usize,
    pub tips_requested: usize,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        AcceptancePolicy {
            max_attempts: 3,
            acceptance_bar: 5,
            max_tips: DEFAULT_MAX_TIPS,
            tips_requested: 10,
        }
    }
}

impl AcceptancePolicy {
    /// Returns the first attempt's tips that reach the acceptance bar.
    pub async fn run(
        &self,
        generator: &dyn TipGenerator,
        snapshot: &EnvironmentalSnapshot,
        now: &DateTime<Local>,
    ) -> Result<Vec<String>, GenerationError> {
        let prompt = build_prompt(snapshot, now, self.tips_requested);
        let mut best = 0;

        for attempt in 1..=self.max_attempts {
            info!("🔄 AI generation attempt {}/{}", attempt, self.max_attempts);

            let raw = match generator.generate(&prompt).await {
                Ok(raw) => raw,
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("❌ AI attempt {} failed: {}", attempt, e);
                    continue;
                }
            };

            let tips = parse_tips(&raw, self.max_tips);
            if tips.len() >= self.acceptance_bar {
                info!(
                    "✅ AI success: {} contextual tips on attempt {}",
                    tips.len(),
                    attempt
                );
                return Ok(tips);
            }

            warn!(
                "⚠️ AI returned only {} tips on attempt {}, retrying...",
                tips.len(),
                attempt
            );
            best = best.max(tips.len());
        }

        Err(GenerationError::InsufficientCandidates {
            found: best,
            required: self.acceptance_bar,
            attempts: self.max_attempts,
        })
    }
}
