// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the best model of a run and restores it for
// re-evaluation.
//
// What gets saved (one set per run variant, overwritten on
// every improvement, never versioned):
//   1. newckpt<variant>.mpk.gz   — model parameters (gzipped named
//                                  MessagePack, half precision)
//   2. newckpt<variant>.json     — { "acc": .., "epoch": .. }
//   3. train_config.json         — the run's configuration
//
// <variant> is `dis` or `no_dis`, so a distillation run and a
// plain run in the same directory never clobber each other.
//
// The directory is only created when something is written.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::{records::CheckpointMeta, run::Variant};
use crate::ml::model::ShakeShake;

const WEIGHTS_SUFFIX: &str = ".mpk.gz";
const PLAIN_MPK_SUFFIX: &str = ".mpk";
const META_SUFFIX: &str    = ".json";
const LEGACY_SUFFIX: &str  = ".pth";

/// Pinned explicitly so the file name does not depend on burn's default recorder.
type CheckpointRecorder = NamedMpkGzFileRecorder<HalfPrecisionSettings>;

/// Saves and loads the single best checkpoint of a run variant.
pub struct CheckpointManager {
    dir:     PathBuf,
    variant: Variant,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, variant: Variant) -> Self {
        Self { dir: dir.into(), variant }
    }

    /// File stem of this variant's checkpoint, e.g. `newckptdis`.
    pub fn stem(&self) -> String {
        format!("newckpt{}", self.variant.save_name())
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))?;
        }
        Ok(())
    }

    /// Overwrite the checkpoint with `model` and its accuracy/epoch.
    pub fn save_best<B: Backend>(&self, model: &ShakeShake<B>, meta: CheckpointMeta) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(self.stem());

        // The recorder appends its own extension to the stem
        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let meta_path = self.dir.join(format!("{}{META_SUFFIX}", self.stem()));
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
            .with_context(|| format!("Cannot write '{}'", meta_path.display()))?;

        tracing::debug!("Saved checkpoint: acc={:.3} epoch={}", meta.acc, meta.epoch);
        Ok(path)
    }

    /// Load weights from the checkpoint named `name` (a stem inside the
    /// checkpoint dir, with or without a file suffix) into `model`.
    pub fn load_weights<B: Backend>(
        &self,
        model:  ShakeShake<B>,
        name:   &str,
        device: &B::Device,
    ) -> Result<ShakeShake<B>> {
        let path = self.dir.join(checkpoint_stem(name));
        tracing::info!("Loading checkpoint weights from '{}'", path.display());

        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    /// Stored accuracy/epoch of a checkpoint, if its metadata file exists.
    pub fn load_meta(&self, name: &str) -> Result<Option<CheckpointMeta>> {
        let path = self.dir.join(format!("{}{META_SUFFIX}", checkpoint_stem(name)));
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Save the run configuration next to the checkpoint.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join("train_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

/// Strip a known checkpoint suffix so the recorder can add its own.
pub fn checkpoint_stem(name: &str) -> &str {
    // `.mpk.gz` must be tried before `.mpk`
    [WEIGHTS_SUFFIX, PLAIN_MPK_SUFFIX, META_SUFFIX, LEGACY_SUFFIX]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}
