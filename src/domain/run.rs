// ============================================================
// Layer 3 — Run Mode and Variant
// ============================================================
// A run is either a fresh training run or a one-shot
// re-evaluation of a saved checkpoint. The choice is made
// once at startup from the presence of a resume path and
// never inspected ad hoc afterwards.
//
// The variant (distillation on/off) only selects the loss
// and the file names; evaluation, logging and checkpointing
// are identical for both.

use serde::{Deserialize, Serialize};

/// How the epoch loop behaves for this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Train for the configured number of epochs
    FreshTrain,

    /// Load the named checkpoint and evaluate it once
    ResumeEvaluate { checkpoint: String },
}

impl RunMode {
    /// Build the mode from an optional resume checkpoint name.
    pub fn from_resume(resume: Option<String>) -> Self {
        match resume {
            Some(checkpoint) => RunMode::ResumeEvaluate { checkpoint },
            None             => RunMode::FreshTrain,
        }
    }

    pub fn is_resume(&self) -> bool {
        matches!(self, RunMode::ResumeEvaluate { .. })
    }
}

/// Which loss the run trains with. Also names every file the run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Self-distillation (interpolated soft targets)
    Distill,

    /// Plain cross-entropy
    Plain,
}

impl Variant {
    /// `--dis 1` selects distillation, `--dis 0` plain cross-entropy.
    pub fn from_flag(dis: u8) -> Self {
        if dis != 0 { Variant::Distill } else { Variant::Plain }
    }

    /// Suffix used in checkpoint and log file names
    pub fn save_name(&self) -> &'static str {
        match self {
            Variant::Distill => "dis",
            Variant::Plain   => "no_dis",
        }
    }
}
