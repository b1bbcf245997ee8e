// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The epoch loop only knows these two traits:
//
//   EpochPhases — the tensor-side work of a run:
//                 train one epoch, evaluate once, persist the
//                 current weights. Implemented by ml::Trainer.
//
//   RecordSink  — where train/test records end up.
//                 Implemented by infra::metrics (one JSONL
//                 file, or the legacy one-file-per-epoch layout).
//
// Keeping the loop behind traits means the run policy can be
// exercised with an in-memory fake instead of a GPU.

use anyhow::Result;
use crate::domain::records::{CheckpointMeta, TestRecord, TrainRecord};

/// Phase functions the epoch loop calls, in order.
pub trait EpochPhases {
    /// Run one full pass over the training set at learning rate `lr`.
    fn train_epoch(&mut self, epoch: usize, lr: f64) -> Result<TrainRecord>;

    /// Run one full pass over the evaluation set without updating weights.
    fn evaluate(&mut self, epoch: usize) -> Result<TestRecord>;

    /// Overwrite the run's single checkpoint with the current weights.
    fn save_checkpoint(&mut self, meta: CheckpointMeta) -> Result<()>;

    /// Release cached device memory between epochs.
    fn release_device_cache(&mut self) {}
}

/// Destination for per-epoch records.
pub trait RecordSink {
    fn write_train(&mut self, record: &TrainRecord) -> Result<()>;

    fn write_test(&mut self, record: &TestRecord) -> Result<()>;
}
