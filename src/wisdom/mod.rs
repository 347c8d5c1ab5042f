//! Daily wisdom tip engine.
//!
//! Turns an [`EnvironmentalSnapshot`] into a rotating stream of short tips.
//! Tips are generated once per local calendar day, cached with the rotation
//! cursor, and replaced by a fixed emergency set when generation fails.

pub mod acceptance;
pub mod batch;
pub mod fallback;
pub mod gemini;
pub mod parser;
pub mod prompt;

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::core::{day_tag, Clock, EnvironmentalSnapshot, GenerationError, KeyValueStore};
use acceptance::AcceptancePolicy;
use batch::{CacheRecord, Origin, TipBatch, TipStore};
use gemini::TipGenerator;

pub const CACHE_KEY: &str = "earthWisdomCache";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "AI-Powered")]
    AiPowered,
    Emergency,
    Loading,
}

/// Diagnostics snapshot of the engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WisdomStats {
    pub total_tips: usize,
    pub cursor: usize,
    pub day_tag: Option<String>,
    pub is_degraded: bool,
    pub has_credential: bool,
    pub mode: Mode,
    pub sample: Vec<String>,
}

/// Result of one generation + parse cycle run outside the cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub success: bool,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
    pub tip_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct WisdomEngine {
    generator: Arc<dyn TipGenerator>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: AcceptancePolicy,
    tips: Mutex<TipStore>,
    // Held for a whole generation cycle
    refresh_lock: tokio::sync::Mutex<()>,
    refresh_epoch: AtomicU64,
}

impl WisdomEngine {
    /// Build an engine, restoring today's cached batch if there is one.
    pub fn new(
        generator: Arc<dyn TipGenerator>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: AcceptancePolicy,
    ) -> Self {
        let today = day_tag(&clock.now());
        let tips = Self::load_cached(store.as_ref(), &today);

        WisdomEngine {
            generator,
            store,
            clock,
            policy,
            tips: Mutex::new(tips),
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    fn load_cached(store: &dyn KeyValueStore, today: &str) -> TipStore {
        let raw = match store.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TipStore::new(),
            Err(e) => {
                warn!("Could not load cached tips: {}", e);
                return TipStore::new();
            }
        };

        match serde_json::from_str::<CacheRecord>(&raw) {
            Ok(record) => {
                let tips = TipStore::restore(record, today);
                if tips.batch().is_some() {
                    info!("📱 Loaded cached Earth wisdom tips");
                }
                tips
            }
            Err(e) => {
                warn!("Could not parse cached tips: {}", e);
                TipStore::new()
            }
        }
    }

    fn lock_tips(&self) -> MutexGuard<'_, TipStore> {
        self.tips.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, tips: &TipStore) {
        let Some(record) = tips.record() else {
            return;
        };
        let result = serde_json::to_string(&record)
            .map_err(Into::into)
            .and_then(|json| self.store.set(CACHE_KEY, &json));
        if let Err(e) = result {
            warn!("Could not save tips to cache: {}", e);
        }
    }

    fn is_fresh(&self, today: &str) -> bool {
        self.lock_tips().is_fresh(today)
    }

    /// Next tip for display. Generates today's batch first if needed.
    pub async fn get_current_tip(&self, snapshot: &EnvironmentalSnapshot) -> String {
        let today = day_tag(&self.clock.now());

        if !self.is_fresh(&today) {
            let _guard = self.refresh_lock.lock().await;
            // another caller may have finished the cycle while we waited
            if !self.is_fresh(&day_tag(&self.clock.now())) {
                self.run_cycle(snapshot).await;
            }
        }

        self.next_tip()
    }

    /// Discard today's batch and generate a new one.
    pub async fn force_refresh(&self, snapshot: &EnvironmentalSnapshot) -> String {
        let seen = self.refresh_epoch.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;

        if self.refresh_epoch.load(Ordering::SeqCst) == seen {
            self.lock_tips().invalidate();
            self.run_cycle(snapshot).await;
        } else {
            info!("🔁 Refresh already completed by a concurrent caller");
        }

        self.next_tip()
    }

    /// Produce and install a batch. Callers must hold `refresh_lock`.
    async fn run_cycle(&self, snapshot: &EnvironmentalSnapshot) {
        let now = self.clock.now();
        let today = day_tag(&now);

        let batch = if !self.generator.has_credential() {
            warn!("🤖 No Gemini API key - AI wisdom unavailable");
            fallback::emergency_batch(&today)
        } else {
            info!("🤖 Generating fresh AI wisdom from Gemini...");
            match self.policy.run(self.generator.as_ref(), snapshot, &now).await {
                Ok(tips) => match TipBatch::new(tips, Origin::Ai, today.as_str()) {
                    Some(batch) => {
                        info!("🎉 Daily AI wisdom ready: {} fresh contextual tips", batch.len());
                        batch
                    }
                    None => fallback::emergency_batch(&today),
                },
                Err(e) => {
                    error!("❌ AI generation failed ({}) - using emergency mode", e);
                    fallback::emergency_batch(&today)
                }
            }
        };

        if batch.origin() == Origin::Emergency {
            info!("🆘 Using emergency mode - please check API key and connection");
        }

        let mut tips = self.lock_tips();
        tips.install(batch);
        self.persist(&tips);
        drop(tips);

        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn next_tip(&self) -> String {
        let mut tips = self.lock_tips();
        match tips.next_tip() {
            Some(tip) => {
                self.persist(&tips);
                tip
            }
            None => fallback::LOADING_TIP.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.lock_tips()
            .batch()
            .map_or(false, |b| b.origin() == Origin::Emergency)
    }

    pub fn get_stats(&self) -> WisdomStats {
        let tips = self.lock_tips();
        let batch = tips.batch();
        let is_degraded = batch.map_or(false, |b| b.origin() == Origin::Emergency);

        let mode = match batch {
            None => Mode::Loading,
            Some(_) if is_degraded => Mode::Emergency,
            Some(_) => Mode::AiPowered,
        };

        WisdomStats {
            total_tips: batch.map_or(0, TipBatch::len),
            cursor: tips.cursor(),
            day_tag: batch
                .map(|b| b.day_tag().to_string())
                .filter(|tag| !tag.is_empty()),
            is_degraded,
            has_credential: self.generator.has_credential(),
            mode,
            sample: batch
                .map(|b| b.tips().iter().take(3).cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// One generate + parse round trip, bypassing the cache entirely.
    pub async fn debug_generate(&self, snapshot: &EnvironmentalSnapshot) -> DebugReport {
        let prompt = prompt::build_prompt(snapshot, &self.clock.now(), self.policy.tips_requested);

        let failed = |prompt: String, e: GenerationError| DebugReport {
            success: false,
            prompt,
            raw_text: None,
            candidates: None,
            tip_count: 0,
            error: Some(e.to_string()),
        };

        if !self.generator.has_credential() {
            return failed(prompt, GenerationError::MissingCredential);
        }

        match self.generator.generate(&prompt).await {
            Ok(raw) => {
                let candidates = parser::parse_tips(&raw, self.policy.max_tips);
                DebugReport {
                    success: true,
                    prompt,
                    tip_count: candidates.len(),
                    raw_text: Some(raw),
                    candidates: Some(candidates),
                    error: None,
                }
            }
            Err(e) => failed(prompt, e),
        }
    }
}
