// ============================================================
// Layer 5 — Frequency Diagnostic
// ============================================================
// Characterises how much of the model's output varies slowly
// over input space ("low frequency") versus quickly.
//
// For every threshold δ the output field h(x) is smoothed with
// a Gaussian kernel of variance δ over the evaluation inputs:
//
//   h_low(x_i) = Σ_j h(x_j) G(x_i - x_j) / Σ_j G(x_i - x_j)
//   G(d)       = exp(-|d|² / (2δ))
//
// and the reported value is the share of output energy that
// survives the filter:  ‖h_low‖² / ‖h‖².
//
// Small δ keeps almost everything (ratio → 1); large δ averages
// the outputs towards their mean.
//
// The N×N distance matrix is never built in one piece: rows are
// processed in blocks, with |a-b|² = |a|² + |b|² - 2 a·b computed
// as one matmul per block on the model's device.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::records::{DeltaRatio, FrequencyReport};

const DEFAULT_BLOCK_ROWS: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct FrequencyProbe {
    block_rows: usize,
}

impl Default for FrequencyProbe {
    fn default() -> Self {
        Self { block_rows: DEFAULT_BLOCK_ROWS }
    }
}

impl FrequencyProbe {
    /// inputs: [N, features], outputs: [N, classes]
    pub fn analyze<B: Backend>(
        &self,
        inputs:  Tensor<B, 2>,
        outputs: Tensor<B, 2>,
        deltas:  &[f64],
    ) -> Result<FrequencyReport> {
        let [n, features] = inputs.dims();
        let [n_out, _]    = outputs.dims();
        ensure!(n == n_out, "frequency probe got {n} inputs but {n_out} outputs");
        ensure!(n > 0, "frequency probe needs at least one sample");
        ensure!(deltas.iter().all(|&d| d > 0.0), "frequency thresholds must be positive");

        let sq_norms   = inputs.clone().powf_scalar(2.0).sum_dim(1); // [N, 1]
        let sq_norms_t = sq_norms.clone().transpose();                // [1, N]
        let inputs_t   = inputs.clone().transpose();                  // [features, N]

        let total_energy: f64 = outputs.clone().powf_scalar(2.0).sum().into_scalar().elem();
        let mut low_energy = vec![0.0f64; deltas.len()];

        let mut start = 0;
        while start < n {
            let end = (start + self.block_rows).min(n);

            let rows     = inputs.clone().slice([start..end, 0..features]);
            let rows_sq  = sq_norms.clone().slice([start..end, 0..1]);
            let sq_dist  = (rows_sq + sq_norms_t.clone() - rows.matmul(inputs_t.clone()).mul_scalar(2.0))
                .clamp_min(0.0); // [block, N]

            for (acc, &delta) in low_energy.iter_mut().zip(deltas) {
                let kernel = sq_dist.clone().div_scalar(-2.0 * delta).exp();
                // Self-distance is 0, so every row sum is at least 1
                let norm = kernel.clone().sum_dim(1);
                let low  = kernel.matmul(outputs.clone()).div(norm);
                let e: f64 = low.powf_scalar(2.0).sum().into_scalar().elem();
                *acc += e;
            }

            start = end;
        }

        let ratios = deltas
            .iter()
            .zip(low_energy)
            .map(|(&delta, low)| DeltaRatio {
                delta,
                low_freq_ratio: if total_energy > 0.0 { low / total_energy } else { 0.0 },
            })
            .collect();

        Ok(FrequencyReport { samples: n, ratios })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn points() -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 2>) {
        let device = Default::default();
        // Three points ten units apart along one axis
        let inputs = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]],
            &device,
        );
        // Zero-mean outputs, so full smoothing removes all energy
        let outputs = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0], [-1.0, 0.0], [0.0, 0.0]],
            &device,
        );
        (inputs, outputs)
    }

    #[test]
    fn test_tiny_delta_keeps_all_energy() {
        let (x, y) = points();
        let report = FrequencyProbe::default().analyze(x, y, &[1e-3]).unwrap();
        assert!((report.ratios[0].low_freq_ratio - 1.0).abs() < 1e-4);
        assert_eq!(report.samples, 3);
    }

    #[test]
    fn test_huge_delta_averages_to_mean() {
        let (x, y) = points();
        let report = FrequencyProbe::default().analyze(x, y, &[1e9]).unwrap();
        assert!(report.ratios[0].low_freq_ratio < 1e-4);
    }

    #[test]
    fn test_ratio_shrinks_as_delta_grows() {
        let (x, y) = points();
        let report = FrequencyProbe::default()
            .analyze(x, y, &[1.0, 50.0, 500.0])
            .unwrap();
        let r: Vec<f64> = report.ratios.iter().map(|d| d.low_freq_ratio).collect();
        assert!(r[0] >= r[1] && r[1] >= r[2], "{r:?}");
    }

    #[test]
    fn test_blocking_does_not_change_result() {
        let (x, y) = points();
        let deltas = [10.0, 100.0];
        let whole  = FrequencyProbe::default().analyze(x.clone(), y.clone(), &deltas).unwrap();
        let rowwise = FrequencyProbe { block_rows: 1 }.analyze(x, y, &deltas).unwrap();
        for (a, b) in whole.ratios.iter().zip(&rowwise.ratios) {
            assert!((a.low_freq_ratio - b.low_freq_ratio).abs() < 1e-5);
        }
        let seen: Vec<f64> = whole.ratios.iter().map(|r| r.delta).collect();
        assert_eq!(seen, deltas.to_vec());
    }

    #[test]
    fn test_mismatched_rows_rejected() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        let y = Tensor::<TestBackend, 2>::zeros([2, 10], &device);
        assert!(FrequencyProbe::default().analyze(x, y, &[1.0]).is_err());
    }
}
