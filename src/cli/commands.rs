// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, which
// share every run flag through the flattened RunArgs.
//
// clap's derive macros generate help text, missing-argument
// errors and the string → number conversions.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::TrainConfig;
use crate::domain::run::Variant;
use crate::infra::metrics::LogLayout;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train shake-shake on CIFAR-10 (or re-evaluate with --resume)
    Train(TrainArgs),

    /// Evaluate a saved checkpoint once on the test split
    Evaluate(EvaluateArgs),
}

/// Flags shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Initial learning rate, annealed to zero over the run
    #[arg(long, default_value_t = 0.2)]
    pub lr: f64,

    /// Training batch size (evaluation always uses 100)
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Data loader worker threads (0 loads on the main thread)
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    #[arg(long, default_value_t = 1800)]
    pub epochs: usize,

    /// Directory for the per-epoch train/test records
    #[arg(long, default_value = "logs")]
    pub logdir: String,

    /// Discrete GPU to run on; the best available adapter when omitted
    #[arg(long)]
    pub gpu_id: Option<usize>,

    /// Run on the CPU adapter instead of a GPU
    #[arg(long)]
    pub cpu: bool,

    /// Self-distillation: 1 to enable, 0 for plain cross-entropy
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub dis: u8,

    /// Weight of the model's own prediction in the distillation target
    #[arg(long, default_value_t = 0.5)]
    pub distill_weight: f64,

    /// CIFAR-10 binary batches (or their parent directory)
    #[arg(long, default_value = "data/cifar10")]
    pub data_dir: String,

    /// Where the best checkpoint is written
    #[arg(long, default_value = "save_model")]
    pub save_dir: String,

    #[arg(long, value_enum, default_value_t = LogLayoutArg::Jsonl)]
    pub log_layout: LogLayoutArg,

    /// Skip the frequency diagnostic on every evaluation
    #[arg(long)]
    pub no_frequency: bool,

    /// Seed for the training loader's shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLayoutArg {
    /// One <variant>_metrics.jsonl file
    Jsonl,
    /// One file per epoch and phase
    PerEpoch,
}

impl From<LogLayoutArg> for LogLayout {
    fn from(arg: LogLayoutArg) -> Self {
        match arg {
            LogLayoutArg::Jsonl    => LogLayout::JsonLines,
            LogLayoutArg::PerEpoch => LogLayout::PerEpoch,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Checkpoint name inside --save-dir; evaluates it once instead of training
    #[arg(long)]
    pub resume: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Checkpoint name inside --save-dir, e.g. newckptdis
    #[arg(long)]
    pub resume: String,

    #[command(flatten)]
    pub run: RunArgs,
}

impl RunArgs {
    /// Convert to the application-layer config.
    /// The application layer never sees clap types.
    pub fn into_config(self, resume: Option<String>) -> TrainConfig {
        TrainConfig {
            data_dir:       self.data_dir,
            save_dir:       self.save_dir,
            logdir:         self.logdir,
            log_layout:     self.log_layout.into(),
            lr:             self.lr,
            batch_size:     self.batch_size,
            num_workers:    self.num_workers,
            epochs:         self.epochs,
            gpu_id:         self.gpu_id,
            cpu:            self.cpu,
            variant:        Variant::from_flag(self.dis),
            distill_weight: self.distill_weight,
            frequency:      !self.no_frequency,
            seed:           self.seed,
            resume,
        }
    }
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        a.run.into_config(a.resume)
    }
}

impl From<EvaluateArgs> for TrainConfig {
    fn from(a: EvaluateArgs) -> Self {
        a.run.into_config(Some(a.resume))
    }
}
