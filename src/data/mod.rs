// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from CIFAR-10 files on disk to tensor batches.
//
//   *.bin batch files
//       │
//       ▼
//   CifarLoader        → parses 3073-byte records
//       │
//       ▼
//   CifarDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   Normalize /        → MapperDataset transforms
//   CropFlipNormalize    (augmentation on the train split only)
//       │
//       ▼
//   CifarBatcher       → stacks samples into [N, 3, 32, 32]
//       │
//       ▼
//   DataLoader         → shuffles, prefetches on worker threads

/// Reads the CIFAR-10 binary distribution from disk
pub mod loader;
/// Raw image type and Burn Dataset implementation
pub mod dataset;
/// Normalisation and train-time augmentation
pub mod preprocessor;
/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
