// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands a TrainConfig to Layer 2.
//
// Two commands are supported:
//   1. `train`    — fresh training run (or, with --resume, a
//                   single evaluation of a saved checkpoint)
//   2. `evaluate` — single evaluation of a saved checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Commands;

use crate::application::train_use_case::{TrainConfig, TrainUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "shake-train",
    version = "0.1.0",
    about = "Train a shake-shake network on CIFAR-10, with optional self-distillation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to the use case. Never computes.
    pub fn run(self) -> Result<()> {
        let config = self.into_config();
        tracing::info!("Run variant '{}', data in '{}'", config.variant().save_name(), config.data_dir);

        let summary = TrainUseCase::new(config).execute()?;
        println!(
            "Done: {} epochs trained, {} evaluations, {} checkpoints, best accuracy {:.3}",
            summary.epochs_trained, summary.evaluations, summary.checkpoints_written, summary.best_acc
        );
        Ok(())
    }

    pub fn into_config(self) -> TrainConfig {
        match self.command {
            Commands::Train(args)    => args.into(),
            Commands::Evaluate(args) => args.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::{RunMode, Variant};
    use crate::infra::metrics::LogLayout;

    fn parse(args: &[&str]) -> Result<TrainConfig, clap::Error> {
        Cli::try_parse_from(std::iter::once("shake-train").chain(args.iter().copied()))
            .map(Cli::into_config)
    }

    #[test]
    fn test_train_defaults() {
        let cfg = parse(&["train"]).unwrap();
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_train_flags() {
        let cfg = parse(&[
            "train", "--dis", "1", "--lr", "0.1", "--epochs", "3",
            "--gpu-id", "1", "--log-layout", "per-epoch", "--no-frequency",
        ])
        .unwrap();
        assert_eq!(cfg.variant(), Variant::Distill);
        assert_eq!(cfg.lr, 0.1);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.gpu_id, Some(1));
        assert_eq!(cfg.log_layout, LogLayout::PerEpoch);
        assert!(!cfg.frequency);
    }

    #[test]
    fn test_resume_on_train_selects_evaluation() {
        let cfg = parse(&["train", "--resume", "newckptdis"]).unwrap();
        assert_eq!(cfg.mode(), RunMode::ResumeEvaluate { checkpoint: "newckptdis".into() });
    }

    #[test]
    fn test_evaluate_requires_resume() {
        assert!(parse(&["evaluate"]).is_err());
        let cfg = parse(&["evaluate", "--resume", "newckptno_dis.pth"]).unwrap();
        assert!(cfg.mode().is_resume());
    }

    #[test]
    fn test_dis_rejects_values_other_than_0_or_1() {
        assert!(parse(&["train", "--dis", "2"]).is_err());
    }
}
