// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the filesystem or the
// hardware:
//
//   checkpoint.rs — best-model weights (gzipped MessagePack) plus
//                   their accuracy/epoch metadata and the run
//                   config, all under the checkpoint dir.
//
//   metrics.rs    — RecordSink implementations that write the
//                   per-epoch train/test records.
//
//   device.rs     — maps --gpu-id / --cpu to a wgpu device.

/// Best-model checkpoint saving and loading
pub mod checkpoint;

/// Train/test record sinks (JSONL or one file per epoch)
pub mod metrics;

/// Accelerator selection
pub mod device;
