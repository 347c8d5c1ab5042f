use serde::{Deserialize, Serialize};

/// Where a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Ai,
    Emergency,
}

/// Non-empty set of tips active for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct TipBatch {
    tips: Vec<String>,
    origin: Origin,
    day_tag: String,
}

impl TipBatch {
    /// Returns `None` for an empty tip list.
    pub fn new(tips: Vec<String>, origin: Origin, day_tag: impl Into<String>) -> Option<Self> {
        if tips.is_empty() {
            return None;
        }
        Some(TipBatch {
            tips,
            origin,
            day_tag: day_tag.into(),
        })
    }

    /// Batch from a built-in list, which is never empty.
    pub(super) fn fixed(tips: &[&str], origin: Origin, day_tag: &str) -> Self {
        debug_assert!(!tips.is_empty());
        TipBatch {
            tips: tips.iter().map(|t| t.to_string()).collect(),
            origin,
            day_tag: day_tag.to_string(),
        }
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn day_tag(&self) -> &str {
        &self.day_tag
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }
}

/// On-disk shape of the cached batch and rotation cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub tips: Vec<String>,
    pub day_tag: String,
    #[serde(default)]
    pub cursor: usize,
    #[serde(default)]
    pub origin: Origin,
}

/// Active batch plus rotation cursor.
#[derive(Debug, Clone, Default)]
pub struct TipStore {
    batch: Option<TipBatch>,
    cursor: usize,
}

impl TipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a cache record, but only if it belongs to `today`.
    pub fn restore(record: CacheRecord, today: &str) -> Self {
        if record.day_tag != today {
            return Self::new();
        }
        match TipBatch::new(record.tips, record.origin, record.day_tag) {
            Some(batch) => {
                let cursor = record.cursor % batch.len();
                TipStore {
                    batch: Some(batch),
                    cursor,
                }
            }
            None => Self::new(),
        }
    }

    pub fn batch(&self) -> Option<&TipBatch> {
        self.batch.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_fresh(&self, today: &str) -> bool {
        self.batch.as_ref().map_or(false, |b| b.day_tag == today)
    }

    /// Replace the active batch and restart rotation.
    pub fn install(&mut self, batch: TipBatch) {
        self.batch = Some(batch);
        self.cursor = 0;
    }

    /// Clear the day-tag so the next request regenerates. Tips stay servable.
    pub fn invalidate(&mut self) {
        if let Some(batch) = self.batch.as_mut() {
            batch.day_tag.clear();
        }
    }

    /// Serve `tips[cursor]` and advance the cursor modulo the batch size.
    pub fn next_tip(&mut self) -> Option<String> {
        let batch = self.batch.as_ref()?;
        let tip = batch.tips[self.cursor].clone();
        self.cursor = (self.cursor + 1) % batch.len();
        Some(tip)
    }

    pub fn record(&self) -> Option<CacheRecord> {
        self.batch.as_ref().map(|batch| CacheRecord {
            tips: batch.tips.clone(),
            day_tag: batch.day_tag.clone(),
            cursor: self.cursor,
            origin: batch.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn tips(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("🌱 tip {}", i)).collect()
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(TipBatch::new(vec![], Origin::Ai, "2026-10-19").is_none());
    }

    #[test]
    fn test_rotation_visits_every_tip_once_per_cycle() {
        for n in 1..=7 {
            let mut store = TipStore::new();
            store.install(TipBatch::new(tips(n), Origin::Ai, "2026-10-19").unwrap());

            let served: Vec<String> = (0..n).map(|_| store.next_tip().unwrap()).collect();
            let unique: HashSet<&String> = served.iter().collect();

            assert_eq!(unique.len(), n);
            assert_eq!(served, tips(n));
            assert_eq!(store.cursor(), 0);
        }
    }

    #[test]
    fn test_empty_store_serves_nothing() {
        let mut store = TipStore::new();
        assert_eq!(store.next_tip(), None);
        assert!(!store.is_fresh("2026-10-19"));
        assert!(store.record().is_none());
    }

    #[test]
    fn test_restore_same_day_keeps_cursor() {
        let record = CacheRecord {
            tips: tips(4),
            day_tag: "2026-10-19".to_string(),
            cursor: 2,
            origin: Origin::Ai,
        };

        let mut store = TipStore::restore(record, "2026-10-19");

        assert!(store.is_fresh("2026-10-19"));
        assert_eq!(store.next_tip().as_deref(), Some("🌱 tip 2"));
    }

    #[test]
    fn test_restore_other_day_starts_empty() {
        let record = CacheRecord {
            tips: tips(4),
            day_tag: "2026-10-18".to_string(),
            cursor: 1,
            origin: Origin::Ai,
        };

        let store = TipStore::restore(record, "2026-10-19");
        assert!(store.batch().is_none());
    }

    #[test]
    fn test_restore_clamps_cursor() {
        let record = CacheRecord {
            tips: tips(3),
            day_tag: "2026-10-19".to_string(),
            cursor: 7,
            origin: Origin::Emergency,
        };

        let store = TipStore::restore(record, "2026-10-19");
        assert_eq!(store.cursor(), 1);
        assert_eq!(store.batch().unwrap().origin(), Origin::Emergency);
    }

    #[test]
    fn test_invalidate_forces_stale_but_keeps_tips() {
        let mut store = TipStore::new();
        store.install(TipBatch::new(tips(2), Origin::Ai, "2026-10-19").unwrap());

        store.invalidate();

        assert!(!store.is_fresh("2026-10-19"));
        assert_eq!(store.next_tip().as_deref(), Some("🌱 tip 0"));
    }

    #[test]
    fn test_record_json_shape() {
        let mut store = TipStore::new();
        store.install(TipBatch::new(tips(2), Origin::Ai, "2026-10-19").unwrap());
        store.next_tip();

        let json = serde_json::to_value(store.record().unwrap()).unwrap();
        assert_eq!(json["dayTag"], "2026-10-19");
        assert_eq!(json["cursor"], 1);
        assert_eq!(json["origin"], "ai");

        let legacy: CacheRecord =
            serde_json::from_str(r#"{"tips":["🌱 a"],"dayTag":"2026-10-19"}"#).unwrap();
        assert_eq!(legacy.cursor, 0);
        assert_eq!(legacy.origin, Origin::Ai);
    }
}
