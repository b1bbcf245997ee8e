// ============================================================
// Layer 4 — Image Preprocessing
// ============================================================
// Turns raw u8 CHW images into normalised f32 samples.
//
// Training images are augmented before normalisation:
//   1. Zero-pad every side by 4 pixels (40×40)
//   2. Take a random 32×32 crop
//   3. Flip horizontally with probability 0.5
// Test images are only normalised.
//
// Normalisation uses the usual per-channel CIFAR-10
// statistics on the [0, 1] pixel scale:
//   x' = (x / 255 - mean[c]) / std[c]
//
// Both transforms implement Burn's Mapper trait, so they
// wrap a CifarDataset in a MapperDataset and run lazily on
// the data loader's worker threads.

use burn::data::dataset::transform::Mapper;
use rand::Rng;

use crate::data::dataset::{CifarImage, CifarSample, CHANNELS, IMAGE_SIZE};

pub const MEAN: [f32; CHANNELS] = [0.4914, 0.4822, 0.4465];
pub const STD:  [f32; CHANNELS] = [0.2023, 0.1994, 0.2010];
pub const CROP_PADDING: usize   = 4;

/// Per-channel normalisation of a CHW u8 image.
pub fn normalize(pixels: &[u8]) -> Vec<f32> {
    let plane = IMAGE_SIZE * IMAGE_SIZE;
    pixels
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let c = i / plane;
            (p as f32 / 255.0 - MEAN[c]) / STD[c]
        })
        .collect()
}

/// Crop a 32×32 window out of the zero-padded image and optionally mirror it.
///
/// `offset_y` / `offset_x` are positions inside the padded 40×40 canvas,
/// so `(CROP_PADDING, CROP_PADDING)` with `flip = false` is the identity.
pub fn crop_and_flip(pixels: &[u8], offset_y: usize, offset_x: usize, flip: bool) -> Vec<u8> {
    let mut out = vec![0u8; pixels.len()];
    let plane = IMAGE_SIZE * IMAGE_SIZE;

    for c in 0..CHANNELS {
        for y in 0..IMAGE_SIZE {
            // Row in the unpadded source; out-of-range rows stay zero
            let src_y = (y + offset_y).checked_sub(CROP_PADDING);
            let Some(src_y) = src_y.filter(|&v| v < IMAGE_SIZE) else { continue };

            for x in 0..IMAGE_SIZE {
                let src_x = (x + offset_x).checked_sub(CROP_PADDING);
                let Some(src_x) = src_x.filter(|&v| v < IMAGE_SIZE) else { continue };

                let dst_x = if flip { IMAGE_SIZE - 1 - x } else { x };
                out[c * plane + y * IMAGE_SIZE + dst_x] =
                    pixels[c * plane + src_y * IMAGE_SIZE + src_x];
            }
        }
    }
    out
}

/// Test-time transform: normalisation only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl Mapper<CifarImage, CifarSample> for Normalize {
    fn map(&self, item: &CifarImage) -> CifarSample {
        CifarSample { pixels: normalize(&item.pixels), label: item.label }
    }
}

/// Train-time transform: random crop, random flip, then normalise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropFlipNormalize;

impl Mapper<CifarImage, CifarSample> for CropFlipNormalize {
    fn map(&self, item: &CifarImage) -> CifarSample {
        let mut rng = rand::thread_rng();
        let offset_y = rng.gen_range(0..=2 * CROP_PADDING);
        let offset_x = rng.gen_range(0..=2 * CROP_PADDING);
        let flip     = rng.gen_bool(0.5);

        let augmented = crop_and_flip(&item.pixels, offset_y, offset_x, flip);
        CifarSample { pixels: normalize(&augmented), label: item.label }
    }
}
