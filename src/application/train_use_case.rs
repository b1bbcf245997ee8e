// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Wires one run together, in order:
//
//   Step 1: Pick variant and device          (Layer 3 / 6)
//   Step 2: Load both CIFAR-10 splits        (Layer 4 - data)
//   Step 3: Build model and optimiser        (Layer 5 - ml)
//   Step 4: Save config / restore weights    (Layer 6 - infra)
//   Step 5: Open the record sink             (Layer 6 - infra)
//   Step 6: Run the epoch loop               (Layer 2 - session)
//
// The same pipeline serves `train` and `evaluate`; only the
// RunMode differs.

use anyhow::Result;
use burn::backend::Wgpu;
use serde::{Deserialize, Serialize};

use crate::application::session::{RunSummary, TrainingSession};
use crate::data::{
    dataset::CLASSES,
    loader::{CifarLoader, Split},
};
use crate::domain::run::{RunMode, Variant};
use crate::infra::{
    checkpoint::CheckpointManager,
    device::select_device,
    metrics::{open_sink, LogLayout},
};
use crate::ml::{
    frequency::FrequencyProbe,
    loss::Criterion,
    model::{ShakeShake, ShakeShakeConfig},
    scheduler::CosineAnnealing,
    trainer::{eval_loader, sgd_config, train_loader, TrainBackend, Trainer},
};

// ─── Run Configuration ───────────────────────────────────────────────────────
// Everything a run needs, saved as train_config.json next to the
// checkpoint so a result can be traced back to its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub save_dir:       String,
    pub logdir:         String,
    pub log_layout:     LogLayout,
    pub lr:             f64,
    pub batch_size:     usize,
    pub num_workers:    usize,
    pub epochs:         usize,
    pub gpu_id:         Option<usize>,
    pub cpu:            bool,
    pub variant:        Variant,
    pub distill_weight: f64,
    pub frequency:      bool,
    pub seed:           u64,
    pub resume:         Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/cifar10".to_string(),
            save_dir:       "save_model".to_string(),
            logdir:         "logs".to_string(),
            log_layout:     LogLayout::JsonLines,
            lr:             0.2,
            batch_size:     128,
            num_workers:    4,
            epochs:         1800,
            gpu_id:         None,
            cpu:            false,
            variant:        Variant::Plain,
            distill_weight: 0.5,
            frequency:      true,
            seed:           42,
            resume:         None,
        }
    }
}

impl TrainConfig {
    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn mode(&self) -> RunMode {
        RunMode::from_resume(self.resume.clone())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the configured training or one-shot evaluation.
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg     = &self.config;
        let variant = cfg.variant();
        let mode    = cfg.mode();

        // ── Step 1: Variant and device ───────────────────────────────────────
        match variant {
            Variant::Distill => println!("start train with distillation"),
            Variant::Plain   => println!("start train without distillation"),
        }
        let device = select_device(cfg.gpu_id, cfg.cpu);

        // ── Step 2: Data ─────────────────────────────────────────────────────
        println!("==> Preparing data..");
        let loader    = CifarLoader::new(&cfg.data_dir);
        let train_set = loader.load(Split::Train)?;
        let test_set  = loader.load(Split::Test)?;
        tracing::info!(
            "Loaded {} train / {} test images from '{}'",
            train_set.image_count(),
            test_set.image_count(),
            loader.root().display()
        );
        tracing::debug!("Classes: {}", CLASSES.join(", "));

        // ── Step 3: Model ────────────────────────────────────────────────────
        println!("==> Making model..");
        let model_cfg = ShakeShakeConfig::new();
        let model: ShakeShake<TrainBackend> = model_cfg.init(&device);
        tracing::info!(
            "Model ready: shake-shake {} 2x{}d, {} classes",
            model_cfg.depth, model_cfg.base_width, model_cfg.num_classes
        );

        // ── Step 4: Checkpoint dir ───────────────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.save_dir, variant);
        if !mode.is_resume() {
            checkpoints.save_config(cfg)?;
        }
        if let RunMode::ResumeEvaluate { checkpoint } = &mode {
            match checkpoints.load_meta(checkpoint)? {
                Some(meta) => tracing::warn!(
                    "Checkpoint '{}' was saved at epoch {} with acc {:.3}; \
                     re-evaluating it as epoch 0 against a best accuracy of 0",
                    checkpoint, meta.epoch, meta.acc
                ),
                None => tracing::warn!("Checkpoint '{}' has no stored accuracy/epoch", checkpoint),
            }
        }

        let mut trainer = Trainer::new(
            model,
            sgd_config().init(),
            Criterion::for_variant(variant, cfg.distill_weight),
            train_loader::<TrainBackend>(train_set, cfg.batch_size, cfg.num_workers, cfg.seed, &device),
            cfg.batch_size,
            eval_loader::<Wgpu>(test_set, cfg.num_workers, &device),
            checkpoints,
            cfg.frequency.then(FrequencyProbe::default),
            device,
        );

        if let RunMode::ResumeEvaluate { checkpoint } = &mode {
            trainer.load_checkpoint(checkpoint)?;
        }

        // ── Step 5: Record sink ──────────────────────────────────────────────
        // A fresh run starts a new log; a re-evaluation appends to it
        let sink = open_sink(cfg.log_layout, &cfg.logdir, variant, !mode.is_resume())?;

        // ── Step 6: Epoch loop ───────────────────────────────────────────────
        let mut session = TrainingSession::new(
            trainer,
            sink,
            mode,
            cfg.epochs,
            CosineAnnealing::new(cfg.lr, cfg.epochs),
        );
        session.run()
    }
}
