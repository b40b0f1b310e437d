//! Per-attack-type occurrence counters

use serde::{Deserialize, Serialize};

/// Display colors, handed out in first-seen order and reused cyclically
pub const PALETTE: &[&str] = &[
    "#ef4444", "#f97316", "#f59e0b", "#eab308", "#84cc16", "#22c55e", "#06b6d4", "#3b82f6",
    "#8b5cf6", "#ec4899",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTypeCount {
    pub attack_type: String,
    pub count: u64,
    pub color: String,
}

/// Newest type first; names compare case-insensitively and keep the
/// spelling they were first seen with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackTypeCounters {
    entries: Vec<AttackTypeCount>,
    /// Distinct types seen since the last reset, drives color assignment
    seen: usize,
}

impl AttackTypeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `label`, returning its updated count
    pub fn record(&mut self, label: &str) -> u64 {
        let key = label.to_lowercase();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.attack_type.to_lowercase() == key)
        {
            entry.count += 1;
            return entry.count;
        }

        let color = PALETTE[self.seen % PALETTE.len()].to_string();
        self.seen += 1;
        self.entries.insert(
            0,
            AttackTypeCount {
                attack_type: label.to_string(),
                count: 1,
                color,
            },
        );
        1
    }

    pub fn get(&self, label: &str) -> Option<&AttackTypeCount> {
        let key = label.to_lowercase();
        self.entries.iter().find(|e| e.attack_type.to_lowercase() == key)
    }

    pub fn entries(&self) -> &[AttackTypeCount] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.seen = 0;
    }
}
