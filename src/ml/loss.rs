// ============================================================
// Layer 5 — Loss Functions
// ============================================================
// Two criteria, picked once at startup by `--dis`:
//
//   CrossEntropy   — plain label cross-entropy
//
//   Interpolation  — self-distillation. The hard one-hot label
//                    is blended with the model's own (detached)
//                    prediction:
//                        q = (1 - w) * onehot(y) + w * softmax(z)
//                    and the loss is the soft-target cross-entropy
//                        L = -mean_i sum_k q_ik * log_softmax(z)_ik
//                    With w = 0 this is exactly CrossEntropy.
//
// The criterion is generic over the backend so the same value
// scores training batches (autodiff) and evaluation batches
// (inner backend).

use burn::{
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
    tensor::activation::{log_softmax, softmax},
};

use crate::domain::run::Variant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    CrossEntropy,
    Interpolation { weight: f64 },
}

impl Criterion {
    /// The loss a run variant trains with.
    pub fn for_variant(variant: Variant, distill_weight: f64) -> Self {
        match variant {
            Variant::Distill => Criterion::Interpolation { weight: distill_weight },
            Variant::Plain   => Criterion::CrossEntropy,
        }
    }

    /// logits: [batch, classes], targets: [batch] → scalar loss [1]
    pub fn forward<B: Backend>(&self, logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        match *self {
            Criterion::CrossEntropy => {
                CrossEntropyLossConfig::new()
                    .init(&logits.device())
                    .forward(logits, targets)
            }
            Criterion::Interpolation { weight } => interpolation_loss(logits, targets, weight),
        }
    }
}

fn interpolation_loss<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>, weight: f64) -> Tensor<B, 1> {
    let [batch, classes] = logits.dims();
    let device = logits.device();

    let one_hot = Tensor::<B, 2>::zeros([batch, classes], &device).scatter(
        1,
        targets.reshape([batch, 1]),
        Tensor::<B, 2>::ones([batch, 1], &device),
    );
    let own = softmax(logits.clone().detach(), 1);
    let soft_targets = one_hot.mul_scalar(1.0 - weight) + own.mul_scalar(weight);

    (soft_targets * log_softmax(logits, 1))
        .sum_dim(1)
        .mean()
        .neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn batch() -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 1, Int>) {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[2.0, 0.5, -1.0], [0.1, 0.2, 3.0]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1], &device);
        (logits, targets)
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem::<f32>()
    }

    #[test]
    fn test_zero_weight_matches_cross_entropy() {
        let (logits, targets) = batch();
        let ce = scalar(Criterion::CrossEntropy.forward(logits.clone(), targets.clone()));
        let interp = scalar(Criterion::Interpolation { weight: 0.0 }.forward(logits, targets));
        assert!((ce - interp).abs() < 1e-5, "ce={ce} interp={interp}");
    }

    #[test]
    fn test_distillation_softens_a_wrong_confident_prediction() {
        // Second sample is confidently class 2 but labelled 1: pulling the
        // target toward the model's own prediction lowers the loss.
        let (logits, targets) = batch();
        let ce = scalar(Criterion::CrossEntropy.forward(logits.clone(), targets.clone()));
        let interp = scalar(Criterion::Interpolation { weight: 0.5 }.forward(logits, targets));
        assert!(interp < ce);
        assert!(interp > 0.0);
    }

    #[test]
    fn test_variant_selects_criterion() {
        assert_eq!(Criterion::for_variant(Variant::Plain, 0.5), Criterion::CrossEntropy);
        assert_eq!(
            Criterion::for_variant(Variant::Distill, 0.3),
            Criterion::Interpolation { weight: 0.3 }
        );
    }
}
