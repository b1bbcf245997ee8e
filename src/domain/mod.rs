// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that describe a
// training run independently of the tensor framework.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only bookkeeping: run mode, accuracy, records
//
// Everything here is unit-testable without a GPU, which is
// where the run's policy (best-model selection, accuracy
// arithmetic) is pinned down.

// Fresh-train vs resume-evaluate, and the dis/no_dis variant
pub mod run;

// Per-epoch accumulators and the best-accuracy record
pub mod metrics;

// Serialisable train/test/checkpoint records
pub mod records;

// Seams between the epoch loop and its collaborators
pub mod traits;
