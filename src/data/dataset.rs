use burn::data::dataset::Dataset;

pub const IMAGE_SIZE: usize     = 32;
pub const CHANNELS: usize       = 3;
pub const IMAGE_BYTES: usize    = CHANNELS * IMAGE_SIZE * IMAGE_SIZE;
pub const NUM_CLASSES: usize    = 10;

/// Label names in index order. Reference only; nothing maps through them.
pub const CLASSES: [&str; NUM_CLASSES] = [
    "plane", "car", "bird", "cat", "deer",
    "dog", "frog", "horse", "ship", "truck",
];

/// One raw CIFAR-10 image. Pixels are channel-major (CHW), 0..=255.
#[derive(Debug, Clone)]
pub struct CifarImage {
    pub pixels: Vec<u8>,
    pub label:  u8,
}

/// A normalised image ready for batching.
#[derive(Debug, Clone)]
pub struct CifarSample {
    pub pixels: Vec<f32>,
    pub label:  u8,
}

pub struct CifarDataset {
    images: Vec<CifarImage>,
}

impl CifarDataset {
    pub fn new(images: Vec<CifarImage>) -> Self { Self { images } }

    pub fn image_count(&self) -> usize { self.images.len() }
}

impl Dataset<CifarImage> for CifarDataset {
    fn get(&self, index: usize) -> Option<CifarImage> {
        self.images.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}
