// ============================================================
// Layer 5 — Epoch Phases
// ============================================================
// The tensor side of a run: one training pass, one evaluation
// pass, and persisting the current weights. The epoch loop
// (application::session) decides when each of these runs.
//
// Key Burn insight:
//   - Training uses B (Autodiff<Wgpu> in production)
//   - model.valid() returns the model on B::InnerBackend, which
//     switches batch norm to its running statistics and the
//     shake-shake mix to a fixed 0.5
//   - The eval loader therefore batches on the inner backend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Optimiser: SGD with momentum 0.9, weight decay 1e-4. The
// learning rate is handed in per epoch by the scheduler.

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{
    backend::{Autodiff, Wgpu},
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::transform::MapperDataset,
    },
    module::AutodiffModule,
    optim::{
        decay::WeightDecayConfig, momentum::MomentumConfig, GradientsParams, Optimizer, SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{CifarBatch, CifarBatcher},
    dataset::{CifarDataset, IMAGE_BYTES},
    preprocessor::{CropFlipNormalize, Normalize},
};
use crate::domain::{
    metrics::RunningMetrics,
    records::{CheckpointMeta, TestRecord, TrainRecord, FREQUENCY_DELTAS},
    traits::EpochPhases,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{frequency::FrequencyProbe, loss::Criterion, model::ShakeShake};

pub type TrainBackend = Autodiff<Wgpu>;

/// The test split is always scored 100 images at a time, in order.
pub const EVAL_BATCH_SIZE: usize = 100;

pub fn sgd_config() -> SgdConfig {
    SgdConfig::new()
        .with_momentum(Some(
            MomentumConfig::new()
                .with_momentum(0.9)
                .with_dampening(0.0)
                .with_nesterov(false),
        ))
        .with_weight_decay(Some(WeightDecayConfig::new(1e-4)))
}

/// Shuffled, augmented loader over the training split.
pub fn train_loader<B: Backend>(
    dataset:     CifarDataset,
    batch_size:  usize,
    num_workers: usize,
    seed:        u64,
    device:      &B::Device,
) -> Arc<dyn DataLoader<CifarBatch<B>>> {
    let mut builder = DataLoaderBuilder::new(CifarBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .shuffle(seed);
    if num_workers > 0 {
        builder = builder.num_workers(num_workers);
    }
    builder.build(MapperDataset::new(dataset, CropFlipNormalize))
}

/// In-order loader over the test split, normalisation only.
pub fn eval_loader<B: Backend>(
    dataset:     CifarDataset,
    num_workers: usize,
    device:      &B::Device,
) -> Arc<dyn DataLoader<CifarBatch<B>>> {
    let mut builder = DataLoaderBuilder::new(CifarBatcher::<B>::new(device.clone()))
        .batch_size(EVAL_BATCH_SIZE);
    if num_workers > 0 {
        builder = builder.num_workers(num_workers);
    }
    builder.build(MapperDataset::new(dataset, Normalize))
}

/// Number of rows whose highest logit matches the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

fn batch_count(items: usize, batch_size: usize) -> usize {
    items.div_ceil(batch_size.max(1))
}

pub struct Trainer<B: AutodiffBackend, O> {
    model:        ShakeShake<B>,
    optim:        O,
    criterion:    Criterion,
    train_loader: Arc<dyn DataLoader<CifarBatch<B>>>,
    train_batch:  usize,
    eval_loader:  Arc<dyn DataLoader<CifarBatch<B::InnerBackend>>>,
    checkpoints:  CheckpointManager,
    frequency:    Option<FrequencyProbe>,
    device:       B::Device,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<ShakeShake<B>, B>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model:        ShakeShake<B>,
        optim:        O,
        criterion:    Criterion,
        train_loader: Arc<dyn DataLoader<CifarBatch<B>>>,
        train_batch:  usize,
        eval_loader:  Arc<dyn DataLoader<CifarBatch<B::InnerBackend>>>,
        checkpoints:  CheckpointManager,
        frequency:    Option<FrequencyProbe>,
        device:       B::Device,
    ) -> Self {
        Self {
            model, optim, criterion, train_loader, train_batch,
            eval_loader, checkpoints, frequency, device,
        }
    }

    /// Replace the current weights with a saved checkpoint.
    pub fn load_checkpoint(&mut self, name: &str) -> Result<()> {
        self.model = self
            .checkpoints
            .load_weights(self.model.clone(), name, &self.device)?;
        Ok(())
    }
}

impl<B, O> EpochPhases for Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<ShakeShake<B>, B>,
{
    fn train_epoch(&mut self, epoch: usize, lr: f64) -> Result<TrainRecord> {
        let mut model   = self.model.clone();
        let mut metrics = RunningMetrics::new();

        for batch in self.train_loader.iter() {
            let batch_size = batch.targets.dims()[0];
            let logits  = model.forward(batch.images);
            let loss    = self.criterion.forward(logits.clone(), batch.targets.clone());
            let correct = count_correct(logits, batch.targets);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            // Backward pass + SGD update
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = self.optim.step(lr, model, grads);

            metrics.record_batch(loss_val, correct, batch_size);
        }
        self.model = model;

        let train_loss = metrics.average_loss()?;
        let train_acc  = metrics.accuracy()?;
        println!(
            "epoch : {} [{}/{}]| loss: {:.3} | acc: {:.3}",
            epoch,
            metrics.batches() - 1,
            batch_count(self.train_loader.num_items(), self.train_batch),
            train_loss,
            train_acc,
        );

        Ok(TrainRecord { epoch, train_loss, train_acc })
    }

    fn evaluate(&mut self, epoch: usize) -> Result<TestRecord> {
        let model = self.model.valid();
        let mut metrics = RunningMetrics::new();
        let mut inputs  = Vec::new();
        let mut outputs = Vec::new();

        for batch in self.eval_loader.iter() {
            let batch_size = batch.targets.dims()[0];
            let logits  = model.forward(batch.images.clone());
            let loss    = self.criterion.forward(logits.clone(), batch.targets.clone());
            let correct = count_correct(logits.clone(), batch.targets);
            metrics.record_batch(loss.into_scalar().elem::<f64>(), correct, batch_size);

            if self.frequency.is_some() {
                inputs.push(batch.images.reshape([batch_size, IMAGE_BYTES]));
                outputs.push(logits);
            }
        }

        let test_loss = metrics.average_loss()?;
        let test_acc  = metrics.accuracy()?;
        println!(
            "test epoch : {} [{}/{}]| loss: {:.3} | acc: {:.3}",
            epoch,
            metrics.batches() - 1,
            batch_count(self.eval_loader.num_items(), EVAL_BATCH_SIZE),
            test_loss,
            test_acc,
        );

        let fre = match &self.frequency {
            Some(probe) => {
                ensure!(!inputs.is_empty(), "evaluation produced no samples for the frequency probe");
                let report = probe.analyze(Tensor::cat(inputs, 0), Tensor::cat(outputs, 0), &FREQUENCY_DELTAS)?;
                let ratios: Vec<f64> = report.ratios.iter().map(|r| r.low_freq_ratio).collect();
                println!("epoch:{} delta:{:?}", epoch, ratios);
                Some(report)
            }
            None => None,
        };

        Ok(TestRecord { epoch, test_loss, test_acc, fre })
    }

    fn save_checkpoint(&mut self, meta: CheckpointMeta) -> Result<()> {
        println!("==> Saving model..");
        self.checkpoints.save_best(&self.model, meta)?;
        Ok(())
    }

    fn release_device_cache(&mut self) {
        B::sync(&self.device);
    }
}
