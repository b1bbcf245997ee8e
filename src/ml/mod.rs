// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All the tensor math of a run lives here.
//
//   model.rs     — shake-shake 26 2×32d residual network
//                  • 3×3 stem + batch norm
//                  • three stages of two-branch blocks whose
//                    outputs are mixed with random per-sample
//                    coefficients while training
//                  • global average pool + linear head
//
//   loss.rs      — plain cross-entropy and the self-distillation
//                  (interpolated soft target) criterion
//
//   scheduler.rs — per-epoch cosine annealing of the learning rate
//
//   frequency.rs — low-pass energy ratio of the model's outputs
//                  over the evaluation inputs
//
//   trainer.rs   — train/evaluate/checkpoint phases behind the
//                  EpochPhases trait, plus the data loader setup
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Gastaldi (2017) Shake-Shake regularization

/// Shake-shake residual network
pub mod model;

/// Training criteria
pub mod loss;

/// Cosine learning-rate schedule
pub mod scheduler;

/// Frequency diagnostic
pub mod frequency;

/// Epoch phases: train, evaluate, checkpoint
pub mod trainer;
