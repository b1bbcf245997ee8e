use std::f64::consts::PI;

/// Per-epoch cosine annealing from `base_lr` down to zero.
///
/// `step()` is called at the top of every epoch and advances the
/// schedule before returning the rate, so epoch `e` trains at `lr(e + 1)`.
#[derive(Debug, Clone)]
pub struct CosineAnnealing {
    base_lr:      f64,
    total_epochs: usize,
    current:      usize,
}

impl CosineAnnealing {
    pub fn new(base_lr: f64, total_epochs: usize) -> Self {
        Self { base_lr, total_epochs: total_epochs.max(1), current: 0 }
    }

    /// Learning rate at position `t` of the schedule.
    pub fn rate_at(&self, t: usize) -> f64 {
        let progress = t.min(self.total_epochs) as f64 / self.total_epochs as f64;
        0.5 * self.base_lr * (1.0 + (PI * progress).cos())
    }

    pub fn step(&mut self) -> f64 {
        self.current += 1;
        self.learning_rate()
    }

    pub fn learning_rate(&self) -> f64 {
        self.rate_at(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_base_and_ends_at_zero() {
        let s = CosineAnnealing::new(0.2, 10);
        assert!((s.rate_at(0) - 0.2).abs() < 1e-12);
        assert!((s.rate_at(5) - 0.1).abs() < 1e-12);
        assert!(s.rate_at(10).abs() < 1e-12);
    }

    #[test]
    fn test_step_advances_before_returning() {
        let mut s = CosineAnnealing::new(0.2, 4);
        let first = s.step();
        assert!((first - s.rate_at(1)).abs() < 1e-12);
        assert!(first < 0.2);
    }

    #[test]
    fn test_rates_never_increase() {
        let mut s = CosineAnnealing::new(1.0, 50);
        let mut prev = s.learning_rate();
        for _ in 0..60 {
            let lr = s.step();
            assert!(lr <= prev + 1e-12);
            assert!(lr >= 0.0);
            prev = lr;
        }
    }
}
