// ============================================================
// Layer 4 — CIFAR-10 Loader
// ============================================================
// Reads the binary distribution of CIFAR-10 from a local
// directory. Nothing is downloaded: the files must already be
// on disk.
//
// File layout (either directly in the root, or inside a
// `cifar-10-batches-bin/` child of it):
//   data_batch_1.bin … data_batch_5.bin   → 50 000 training images
//   test_batch.bin                        → 10 000 test images
//
// Each record is 3073 bytes:
//   [label: u8][red 1024 bytes][green 1024 bytes][blue 1024 bytes]
// i.e. the pixels are already channel-major, which is what the
// convolution layers want.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::dataset::{CifarDataset, CifarImage, IMAGE_BYTES, NUM_CLASSES};

const RECORD_BYTES: usize = 1 + IMAGE_BYTES;
const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin", "data_batch_2.bin", "data_batch_3.bin",
    "data_batch_4.bin", "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];
const NESTED_DIR: &str = "cifar-10-batches-bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn files(&self) -> &'static [&'static str] {
        match self {
            Split::Train => &TRAIN_FILES,
            Split::Test  => &TEST_FILES,
        }
    }
}

/// Loads CIFAR-10 splits from a directory on disk.
pub struct CifarLoader {
    root: PathBuf,
}

impl CifarLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load every record of a split into an in-memory dataset.
    pub fn load(&self, split: Split) -> Result<CifarDataset> {
        let dir = self.batches_dir();
        let mut images = Vec::new();

        for name in split.files() {
            let path = dir.join(name);
            let bytes = fs::read(&path)
                .with_context(|| format!("Cannot read CIFAR-10 file '{}'", path.display()))?;
            let parsed = parse_records(&bytes)
                .with_context(|| format!("Malformed CIFAR-10 file '{}'", path.display()))?;
            tracing::debug!("Loaded {} images from '{}'", parsed.len(), path.display());
            images.extend(parsed);
        }

        tracing::info!("Loaded {:?} split: {} images", split, images.len());
        Ok(CifarDataset::new(images))
    }

    /// The root itself, or its `cifar-10-batches-bin/` child if that exists.
    fn batches_dir(&self) -> PathBuf {
        let nested = self.root.join(NESTED_DIR);
        if nested.is_dir() { nested } else { self.root.clone() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Split a raw batch file into images.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<CifarImage>> {
    if bytes.len() % RECORD_BYTES != 0 {
        bail!(
            "length {} is not a multiple of the {}-byte record size",
            bytes.len(), RECORD_BYTES
        );
    }

    bytes
        .chunks_exact(RECORD_BYTES)
        .enumerate()
        .map(|(i, record)| {
            let label = record[0];
            if label as usize >= NUM_CLASSES {
                bail!("record {i} has label {label}, expected 0..{NUM_CLASSES}");
            }
            Ok(CifarImage { pixels: record[1..].to_vec(), label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::Dataset;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(fill).take(IMAGE_BYTES));
        r
    }

    #[test]
    fn test_parse_two_records() {
        let mut bytes = record(3, 10);
        bytes.extend(record(9, 200));
        let images = parse_records(&bytes).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].label, 3);
        assert_eq!(images[1].pixels.len(), IMAGE_BYTES);
        assert!(images[1].pixels.iter().all(|&p| p == 200));
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let mut bytes = record(1, 0);
        bytes.pop();
        assert!(parse_records(&bytes).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        assert!(parse_records(&record(10, 0)).is_err());
    }

    #[test]
    fn test_load_test_split_from_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join(NESTED_DIR);
        fs::create_dir_all(&nested).unwrap();
        let mut bytes = record(0, 1);
        bytes.extend(record(4, 2));
        bytes.extend(record(7, 3));
        fs::write(nested.join(TEST_FILES[0]), bytes).unwrap();

        let ds = CifarLoader::new(tmp.path()).load(Split::Test).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(1).unwrap().label, 4);
    }

    #[test]
    fn test_missing_files_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(CifarLoader::new(tmp.path()).load(Split::Train).is_err());
    }
}
