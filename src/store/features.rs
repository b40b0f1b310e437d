//! Feature-importance ranking: authoritative replace or jittered drift

use crate::event::FeatureWeight;
use rand::Rng;

/// Ranking shown before the classifier has sent one
pub fn default_features() -> Vec<FeatureWeight> {
    vec![
        FeatureWeight::new("Flow Duration", 0.234),
        FeatureWeight::new("Total Fwd Packets", 0.189),
        FeatureWeight::new("Total Bwd Packets", 0.156),
        FeatureWeight::new("Flow Bytes/s", 0.142),
        FeatureWeight::new("Flow Packets/s", 0.128),
        FeatureWeight::new("Fwd IAT Mean", 0.089),
        FeatureWeight::new("Bwd IAT Mean", 0.062),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportanceRanking {
    entries: Vec<FeatureWeight>,
}

impl FeatureImportanceRanking {
    pub fn new(initial: Vec<FeatureWeight>) -> Self {
        Self {
            entries: sanitize(&initial),
        }
    }

    /// Replace the whole ranking, keeping the given order.
    ///
    /// Non-finite weights are dropped and negatives clamped to 0. Returns
    /// `false` (ranking untouched) when nothing usable remains.
    pub fn replace(&mut self, weights: &[FeatureWeight]) -> bool {
        let cleaned = sanitize(weights);
        if cleaned.is_empty() {
            return false;
        }
        self.entries = cleaned;
        true
    }

    /// Nudge every weight by a uniform delta in `[-jitter, +jitter]`,
    /// clamped at 0. Identity, order and length never change.
    pub fn perturb<R: Rng>(&mut self, rng: &mut R, jitter: f64) {
        // `gen_range` needs the span `2 * jitter` to be finite
        if !jitter.is_finite() || jitter <= 0.0 || !(2.0 * jitter).is_finite() {
            return;
        }

        for entry in self.entries.iter_mut() {
            let delta: f64 = rng.gen_range(-jitter..=jitter);
            entry.importance = (entry.importance + delta).max(0.0);
        }
    }

    pub fn entries(&self) -> &[FeatureWeight] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sanitize(weights: &[FeatureWeight]) -> Vec<FeatureWeight> {
    weights
        .iter()
        .filter(|w| w.importance.is_finite())
        .map(|w| FeatureWeight::new(w.feature.clone(), w.importance.max(0.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_perturb_preserves_identity_and_length() {
        let mut ranking = FeatureImportanceRanking::new(default_features());
        let names_before: Vec<String> = ranking.entries().iter().map(|w| w.feature.clone()).collect();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            ranking.perturb(&mut rng, 0.05);
        }

        let names_after: Vec<String> = ranking.entries().iter().map(|w| w.feature.clone()).collect();
        assert_eq!(names_before, names_after);
        assert!(ranking.entries().iter().all(|w| w.importance >= 0.0));
    }

    #[test]
    fn test_perturb_stays_within_jitter() {
        let mut ranking = FeatureImportanceRanking::new(vec![FeatureWeight::new("Flow Duration", 0.5)]);
        let mut rng = StdRng::seed_from_u64(42);

        ranking.perturb(&mut rng, 0.01);
        let moved = (ranking.entries()[0].importance - 0.5).abs();
        assert!(moved <= 0.01 + 1e-12, "moved {} beyond jitter", moved);
    }

    #[test]
    fn test_zero_jitter_is_frozen() {
        let mut ranking = FeatureImportanceRanking::new(default_features());
        let mut rng = StdRng::seed_from_u64(1);
        ranking.perturb(&mut rng, 0.0);
        assert_eq!(ranking.entries(), default_features().as_slice());
    }

    #[test]
    fn test_unrepresentable_jitter_is_ignored() {
        let mut ranking = FeatureImportanceRanking::new(default_features());
        let mut rng = StdRng::seed_from_u64(1);

        ranking.perturb(&mut rng, 1e308);
        ranking.perturb(&mut rng, f64::INFINITY);
        ranking.perturb(&mut rng, f64::NAN);
        assert_eq!(ranking.entries(), default_features().as_slice());
    }

    #[test]
    fn test_replace_sets_exact_list() {
        let mut ranking = FeatureImportanceRanking::new(default_features());
        let given = vec![
            FeatureWeight::new("Bwd IAT Mean", 0.6),
            FeatureWeight::new("Flow Duration", 0.4),
        ];

        assert!(ranking.replace(&given));
        assert_eq!(ranking.entries(), given.as_slice());
    }

    #[test]
    fn test_replace_rejects_unusable_list() {
        let mut ranking = FeatureImportanceRanking::new(default_features());
        let junk = vec![FeatureWeight::new("Flow Duration", f64::NAN)];

        assert!(!ranking.replace(&junk));
        assert_eq!(ranking.len(), 7);
    }

    #[test]
    fn test_replace_clamps_negative() {
        let mut ranking = FeatureImportanceRanking::new(Vec::new());
        ranking.replace(&[FeatureWeight::new("Flow Bytes/s", -0.2)]);
        assert_eq!(ranking.entries()[0].importance, 0.0);
    }
}
