// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to run one training process.
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination and run policy
//
//   train_use_case.rs — builds data, model, trainer and sink
//                       from a TrainConfig
//   session.rs        — the epoch loop: schedule, train,
//                       evaluate, checkpoint-on-improvement

// The run wiring
pub mod train_use_case;

// The epoch loop and best-accuracy policy
pub mod session;
