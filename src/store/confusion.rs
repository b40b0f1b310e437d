//! Binarized confusion matrix and the headline quality metrics derived from it

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryClass {
    Benign,
    Attack,
}

impl BinaryClass {
    /// Anything mentioning "benign" (any case) is benign; the rest is an attack
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("benign") {
            BinaryClass::Benign
        } else {
            BinaryClass::Attack
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCell {
    pub predicted: BinaryClass,
    pub actual: BinaryClass,
    pub count: u64,
}

/// Four fixed cells; counts only move up until [`ConfusionMatrix::reset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    cells: [ConfusionCell; 4],
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        use BinaryClass::{Attack, Benign};

        let cell = |predicted, actual| ConfusionCell {
            predicted,
            actual,
            count: 0,
        };

        Self {
            cells: [
                cell(Benign, Benign),
                cell(Benign, Attack),
                cell(Attack, Benign),
                cell(Attack, Attack),
            ],
        }
    }

    fn index(predicted: BinaryClass, actual: BinaryClass) -> usize {
        match (predicted, actual) {
            (BinaryClass::Benign, BinaryClass::Benign) => 0,
            (BinaryClass::Benign, BinaryClass::Attack) => 1,
            (BinaryClass::Attack, BinaryClass::Benign) => 2,
            (BinaryClass::Attack, BinaryClass::Attack) => 3,
        }
    }

    /// Binarize both labels and bump the matching cell
    pub fn record(&mut self, predicted_label: &str, true_label: &str) -> (BinaryClass, BinaryClass) {
        let predicted = BinaryClass::from_label(predicted_label);
        let actual = BinaryClass::from_label(true_label);
        self.increment(predicted, actual);
        (predicted, actual)
    }

    pub fn increment(&mut self, predicted: BinaryClass, actual: BinaryClass) {
        let cell = &mut self.cells[Self::index(predicted, actual)];
        cell.count = cell.count.saturating_add(1);
    }

    pub fn count(&self, predicted: BinaryClass, actual: BinaryClass) -> u64 {
        self.cells[Self::index(predicted, actual)].count
    }

    pub fn cells(&self) -> &[ConfusionCell] {
        &self.cells
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.count = 0;
        }
    }

    /// Attack is the positive class
    pub fn quality(&self) -> DetectionQuality {
        use BinaryClass::{Attack, Benign};

        let tp = self.count(Attack, Attack) as f64;
        let tn = self.count(Benign, Benign) as f64;
        let fp = self.count(Attack, Benign) as f64;
        let fn_ = self.count(Benign, Attack) as f64;

        DetectionQuality {
            accuracy: ratio(tp + tn, tp + tn + fp + fn_),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            false_positive_rate: ratio(fp, fp + tn),
        }
    }
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

/// Headline metrics; `None` while a denominator is still zero
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionQuality {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub false_positive_rate: Option<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarization() {
        assert_eq!(BinaryClass::from_label("Benign"), BinaryClass::Benign);
        assert_eq!(BinaryClass::from_label("BENIGN"), BinaryClass::Benign);
        assert_eq!(BinaryClass::from_label("likely-benign traffic"), BinaryClass::Benign);
        assert_eq!(BinaryClass::from_label("DDoS"), BinaryClass::Attack);
        assert_eq!(BinaryClass::from_label("Unknown"), BinaryClass::Attack);
    }

    #[test]
    fn test_record_touches_one_cell() {
        let mut matrix = ConfusionMatrix::new();
        matrix.record("DDoS", "DoS");
        matrix.record("Benign", "PortScan");

        assert_eq!(matrix.count(BinaryClass::Attack, BinaryClass::Attack), 1);
        assert_eq!(matrix.count(BinaryClass::Benign, BinaryClass::Attack), 1);
        assert_eq!(matrix.count(BinaryClass::Benign, BinaryClass::Benign), 0);
        assert_eq!(matrix.count(BinaryClass::Attack, BinaryClass::Benign), 0);
        assert_eq!(matrix.total(), 2);
        assert_eq!(matrix.cells().len(), 4);
    }

    #[test]
    fn test_reset_keeps_cells() {
        let mut matrix = ConfusionMatrix::new();
        matrix.record("DoS", "DoS");
        matrix.reset();
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.cells().len(), 4);
    }

    #[test]
    fn test_quality_metrics() {
        let mut matrix = ConfusionMatrix::new();
        assert_eq!(matrix.quality(), DetectionQuality::default());

        // 3 TP, 1 FP, 1 FN, 5 TN
        for _ in 0..3 {
            matrix.record("DoS", "DoS");
        }
        matrix.record("DoS", "Benign");
        matrix.record("Benign", "PortScan");
        for _ in 0..5 {
            matrix.record("Benign", "Benign");
        }

        let quality = matrix.quality();
        assert_eq!(quality.accuracy, Some(0.8));
        assert_eq!(quality.precision, Some(0.75));
        assert_eq!(quality.recall, Some(0.75));
        assert_eq!(quality.false_positive_rate, Some(1.0 / 6.0));
    }
}
