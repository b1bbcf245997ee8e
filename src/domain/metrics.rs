// ============================================================
// Layer 3 — Running Metrics and Best Accuracy
// ============================================================
// RunningMetrics is created fresh for every train or eval
// pass and thrown away once the epoch's record is written.
//
// BestAccuracy is the only value carried across epochs. It
// decides whether a checkpoint is persisted:
//   new accuracy >  best  → save, raise the record
//   new accuracy <= best  → no write
// so the record can never go down.

use anyhow::{bail, Result};

/// Loss / correct / total accumulators for one pass over a loader.
#[derive(Debug, Clone, Default)]
pub struct RunningMetrics {
    loss_sum: f64,
    batches:  usize,
    correct:  usize,
    total:    usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the running sums.
    pub fn record_batch(&mut self, loss: f64, correct: usize, batch_size: usize) {
        self.loss_sum += loss;
        self.batches  += 1;
        self.correct  += correct;
        self.total    += batch_size;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Mean of the per-batch losses.
    pub fn average_loss(&self) -> Result<f64> {
        if self.batches == 0 {
            bail!("loader yielded no batches; cannot average loss");
        }
        Ok(self.loss_sum / self.batches as f64)
    }

    /// Percentage accuracy, `100 * correct / total`.
    pub fn accuracy(&self) -> Result<f64> {
        if self.total == 0 {
            bail!("loader yielded no samples; cannot compute accuracy");
        }
        Ok(100.0 * self.correct as f64 / self.total as f64)
    }
}

/// Highest evaluation accuracy seen so far in this run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestAccuracy {
    value: f64,
}

impl BestAccuracy {
    /// Start from an explicit baseline (0 for both fresh and resumed runs).
    pub fn new(baseline: f64) -> Self {
        Self { value: baseline }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Offer a new accuracy. Returns true, and raises the record,
    /// only when `acc` strictly exceeds the current best.
    pub fn observe(&mut self, acc: f64) -> bool {
        if acc > self.value {
            self.value = acc;
            true
        } else {
            false
        }
    }
}

impl Default for BestAccuracy {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_is_percentage() {
        let mut m = RunningMetrics::new();
        m.record_batch(1.0, 3, 4);
        m.record_batch(3.0, 1, 4);
        assert_eq!(m.accuracy().unwrap(), 50.0);
        assert_eq!(m.average_loss().unwrap(), 2.0);
    }

    #[test]
    fn test_full_test_split_all_correct_is_exactly_100() {
        // 10 000 samples, batch 100, every prediction right
        let mut m = RunningMetrics::new();
        for _ in 0..100 {
            m.record_batch(0.01, 100, 100);
        }
        assert_eq!(m.total, 10_000);
        assert_eq!(m.accuracy().unwrap(), 100.0);
    }

    #[test]
    fn test_empty_pass_is_an_error() {
        let m = RunningMetrics::new();
        assert!(m.accuracy().is_err());
        assert!(m.average_loss().is_err());
    }

    #[test]
    fn test_best_accuracy_only_moves_up() {
        let mut best = BestAccuracy::default();
        assert!(best.observe(40.0));
        assert!(!best.observe(40.0)); // equal is not an improvement
        assert!(!best.observe(12.5));
        assert_eq!(best.value(), 40.0);
        assert!(best.observe(40.5));
        assert_eq!(best.value(), 40.5);
    }

    #[test]
    fn test_zero_accuracy_never_beats_zero_baseline() {
        let mut best = BestAccuracy::new(0.0);
        assert!(!best.observe(0.0));
    }
}
