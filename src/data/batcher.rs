// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<CifarSample>
// into tensors on the target device.
//
//   Input:  N samples, each 3×32×32 f32 pixels + a label
//   Output: images  [N, 3, 32, 32]
//           targets [N]
//
// All pixels are flattened into one Vec in sample order and
// reshaped once, so there is a single host→device copy per
// batch.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{CifarSample, CHANNELS, IMAGE_SIZE};

/// A batch of images and their class labels.
#[derive(Debug, Clone)]
pub struct CifarBatch<B: Backend> {
    /// Normalised pixels — shape: [batch_size, 3, 32, 32]
    pub images: Tensor<B, 4>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the device so batches are created where the model lives.
#[derive(Clone, Debug)]
pub struct CifarBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> CifarBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<CifarSample, CifarBatch<B>> for CifarBatcher<B> {
    fn batch(&self, items: Vec<CifarSample>) -> CifarBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, IMAGE_SIZE, IMAGE_SIZE]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        CifarBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::data::dataset::IMAGE_BYTES;

    #[test]
    fn test_batch_shapes_and_labels() {
        let device = Default::default();
        let batcher = CifarBatcher::<NdArray>::new(device);
        let items = vec![
            CifarSample { pixels: vec![0.5; IMAGE_BYTES], label: 2 },
            CifarSample { pixels: vec![-1.0; IMAGE_BYTES], label: 8 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 3, 32, 32]);
        assert_eq!(batch.targets.dims(), [2]);

        let labels = batch.targets.into_data().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![2, 8]);
    }
}
