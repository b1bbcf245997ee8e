// ============================================================
// Layer 6 — Record Sinks
// ============================================================
// Writes the per-epoch train/test records.
//
// Two layouts are supported:
//
//   JsonLines (default)
//     One file per run variant, truncated when a fresh training
//     run opens it and appended to by a re-evaluation:
//       <logdir>/<variant>_metrics.jsonl
//     one JSON object per line, tagged with "kind":
//       {"kind":"train","epoch":0,"train_loss":2.1,"train_acc":21.4}
//       {"kind":"test","epoch":0,"test_loss":1.8,"test_acc":33.0,"fre":{...}}
//     A long run stays in a single file, and the file can be
//     tailed or loaded straight into a dataframe.
//
//   PerEpoch
//     The older layout, one small file per record:
//       <logdir>/<epoch><variant>_train.txt
//       <logdir>/<epoch><variant>_test.txt
//     each containing the record as JSON.
//
// Both carry exactly the same fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::{
    records::{LogRecord, TestRecord, TrainRecord},
    run::Variant,
    traits::RecordSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLayout {
    JsonLines,
    PerEpoch,
}

/// Open the sink for `layout`, creating `dir` if needed.
///
/// `fresh` starts the JSONL log over so two training runs never share
/// one file under the same epoch numbers.
pub fn open_sink(
    layout:  LogLayout,
    dir:     impl AsRef<Path>,
    variant: Variant,
    fresh:   bool,
) -> Result<Box<dyn RecordSink>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log dir '{}'", dir.display()))?;

    Ok(match layout {
        LogLayout::JsonLines => {
            let sink = JsonLinesSink::new(dir, variant);
            if fresh {
                sink.truncate()?;
            }
            Box::new(sink)
        }
        LogLayout::PerEpoch => Box::new(PerEpochFileSink::new(dir, variant)),
    })
}

/// Appends every record as one JSON line.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(dir: &Path, variant: Variant) -> Self {
        Self { path: dir.join(format!("{}_metrics.jsonl", variant.save_name())) }
    }

    /// Empty the log, creating it if missing.
    pub fn truncate(&self) -> Result<()> {
        fs::File::create(&self.path)
            .with_context(|| format!("Cannot truncate '{}'", self.path.display()))?;
        tracing::debug!("Started new log '{}'", self.path.display());
        Ok(())
    }

    fn append(&self, record: &LogRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;

        writeln!(f, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }
}

impl RecordSink for JsonLinesSink {
    fn write_train(&mut self, record: &TrainRecord) -> Result<()> {
        self.append(&LogRecord::Train(record.clone()))
    }

    fn write_test(&mut self, record: &TestRecord) -> Result<()> {
        self.append(&LogRecord::Test(record.clone()))
    }
}

/// One file per epoch and phase, named `<epoch><variant>_<phase>.txt`.
pub struct PerEpochFileSink {
    dir:     PathBuf,
    variant: Variant,
}

impl PerEpochFileSink {
    pub fn new(dir: &Path, variant: Variant) -> Self {
        Self { dir: dir.to_path_buf(), variant }
    }

    pub fn path_for(&self, epoch: usize, phase: &str) -> PathBuf {
        self.dir.join(format!("{}{}_{}.txt", epoch, self.variant.save_name(), phase))
    }

    fn write<T: Serialize>(&self, path: PathBuf, record: &T) -> Result<()> {
        fs::write(&path, serde_json::to_string_pretty(record)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }
}

impl RecordSink for PerEpochFileSink {
    fn write_train(&mut self, record: &TrainRecord) -> Result<()> {
        self.write(self.path_for(record.epoch, "train"), record)
    }

    fn write_test(&mut self, record: &TestRecord) -> Result<()> {
        self.write(self.path_for(record.epoch, "test"), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{DeltaRatio, FrequencyReport};

    fn train(epoch: usize) -> TrainRecord {
        TrainRecord { epoch, train_loss: 1.25, train_acc: 60.0 }
    }

    fn test(epoch: usize) -> TestRecord {
        TestRecord {
            epoch,
            test_loss: 0.9,
            test_acc:  70.0,
            fre: Some(FrequencyReport {
                samples: 1,
                ratios: vec![DeltaRatio { delta: 1.0, low_freq_ratio: 0.99 }],
            }),
        }
    }

    #[test]
    fn test_jsonl_appends_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = JsonLinesSink::new(tmp.path(), Variant::Distill);
        sink.write_train(&train(0)).unwrap();
        sink.write_test(&test(0)).unwrap();
        sink.write_train(&train(1)).unwrap();

        let text = fs::read_to_string(tmp.path().join("dis_metrics.jsonl")).unwrap();
        let lines: Vec<LogRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], LogRecord::Test(test(0)));
        assert_eq!(lines[2], LogRecord::Train(train(1)));
    }

    #[test]
    fn test_per_epoch_layout_names_files_by_epoch_and_variant() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = PerEpochFileSink::new(tmp.path(), Variant::Plain);
        sink.write_train(&train(12)).unwrap();
        sink.write_test(&test(12)).unwrap();

        let train_path = tmp.path().join("12no_dis_train.txt");
        let test_path  = tmp.path().join("12no_dis_test.txt");
        let back: TrainRecord = serde_json::from_str(&fs::read_to_string(train_path).unwrap()).unwrap();
        let back_test: TestRecord = serde_json::from_str(&fs::read_to_string(test_path).unwrap()).unwrap();
        assert_eq!(back, train(12));
        assert_eq!(back_test.fre.unwrap().ratios.len(), 1);
    }

    #[test]
    fn test_open_sink_creates_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let mut sink = open_sink(LogLayout::JsonLines, &dir, Variant::Plain, true).unwrap();
        sink.write_train(&train(0)).unwrap();
        assert!(dir.join("no_dis_metrics.jsonl").exists());
    }

    fn read_records(path: &Path) -> Vec<LogRecord> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_second_fresh_run_replaces_previous_log() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dis_metrics.jsonl");

        let mut first = open_sink(LogLayout::JsonLines, tmp.path(), Variant::Distill, true).unwrap();
        first.write_train(&train(0)).unwrap();
        first.write_train(&train(1)).unwrap();
        drop(first);

        let mut second = open_sink(LogLayout::JsonLines, tmp.path(), Variant::Distill, true).unwrap();
        second.write_train(&train(0)).unwrap();

        assert_eq!(read_records(&path), vec![LogRecord::Train(train(0))]);
    }

    #[test]
    fn test_resumed_evaluation_appends_to_existing_log() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no_dis_metrics.jsonl");

        let mut run = open_sink(LogLayout::JsonLines, tmp.path(), Variant::Plain, true).unwrap();
        run.write_train(&train(0)).unwrap();
        drop(run);

        let mut eval = open_sink(LogLayout::JsonLines, tmp.path(), Variant::Plain, false).unwrap();
        eval.write_test(&test(0)).unwrap();

        assert_eq!(read_records(&path), vec![LogRecord::Train(train(0)), LogRecord::Test(test(0))]);
    }
}
