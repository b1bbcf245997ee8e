// ============================================================
// Layer 2 — Training Session (the epoch loop)
// ============================================================
// Owns everything a run mutates across epochs:
//   - the phases (model, optimiser, loaders)
//   - the record sink
//   - the learning-rate schedule
//   - the best accuracy seen so far
//
// FreshTrain, for each epoch in [0, epochs):
//   1. step the schedule
//   2. train one epoch            → train record
//   3. evaluate                   → test record
//   4. checkpoint iff test_acc > best
//   5. flush device work
//   6. report the best accuracy
//
// ResumeEvaluate: one evaluation labelled epoch 0 against a
// baseline of 0, checkpoint policy included, then stop.

use anyhow::Result;

use crate::domain::{
    metrics::BestAccuracy,
    records::CheckpointMeta,
    run::RunMode,
    traits::{EpochPhases, RecordSink},
};
use crate::ml::scheduler::CosineAnnealing;

/// What a finished run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub best_acc:            f64,
    pub epochs_trained:      usize,
    pub evaluations:         usize,
    pub checkpoints_written: usize,
}

pub struct TrainingSession<P: EpochPhases> {
    phases:    P,
    sink:      Box<dyn RecordSink>,
    mode:      RunMode,
    epochs:    usize,
    scheduler: CosineAnnealing,
    best:      BestAccuracy,
    summary:   RunSummary,
}

impl<P: EpochPhases> TrainingSession<P> {
    pub fn new(
        phases:    P,
        sink:      Box<dyn RecordSink>,
        mode:      RunMode,
        epochs:    usize,
        scheduler: CosineAnnealing,
    ) -> Self {
        Self {
            phases,
            sink,
            mode,
            epochs,
            scheduler,
            best: BestAccuracy::default(),
            summary: RunSummary {
                best_acc: 0.0,
                epochs_trained: 0,
                evaluations: 0,
                checkpoints_written: 0,
            },
        }
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        match self.mode.clone() {
            RunMode::FreshTrain => {
                for epoch in 0..self.epochs {
                    let lr = self.scheduler.step();
                    tracing::debug!("Epoch {} learning rate {:.6}", epoch, lr);

                    let train = self.phases.train_epoch(epoch, lr)?;
                    self.sink.write_train(&train)?;
                    self.summary.epochs_trained += 1;

                    self.evaluate_and_checkpoint(epoch)?;
                    self.phases.release_device_cache();

                    println!("best test accuracy is {}", self.best.value());
                }
            }
            RunMode::ResumeEvaluate { checkpoint } => {
                tracing::info!("Evaluating checkpoint '{}' once", checkpoint);
                self.evaluate_and_checkpoint(0)?;
            }
        }

        self.summary.best_acc = self.best.value();
        Ok(self.summary.clone())
    }

    /// Evaluate once, log the record, and persist the weights on a new best.
    pub fn evaluate_and_checkpoint(&mut self, epoch: usize) -> Result<bool> {
        let test = self.phases.evaluate(epoch)?;
        self.sink.write_test(&test)?;
        self.summary.evaluations += 1;

        if !self.best.observe(test.test_acc) {
            return Ok(false);
        }

        self.phases.save_checkpoint(CheckpointMeta { acc: test.test_acc, epoch })?;
        self.summary.checkpoints_written += 1;
        tracing::info!("New best accuracy {:.3} at epoch {}", test.test_acc, epoch);
        Ok(true)
    }
}
