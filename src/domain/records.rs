use serde::{Deserialize, Serialize};

/// Fixed thresholds handed to the frequency analysis on every evaluation.
pub const FREQUENCY_DELTAS: [f64; 12] = [
    1.0, 10.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1000.0,
];

/// Summary of one training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
}

/// Summary of one evaluation pass, including the frequency diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub epoch:     usize,
    pub test_loss: f64,
    pub test_acc:  f64,
    /// `None` when the probe is switched off
    pub fre:       Option<FrequencyReport>,
}

/// Low-pass energy ratio for a single threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaRatio {
    pub delta:          f64,
    pub low_freq_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyReport {
    /// Number of evaluation samples the ratios were computed over
    pub samples: usize,
    pub ratios:  Vec<DeltaRatio>,
}


/// Metadata stored next to the checkpoint weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub acc:   f64,
    pub epoch: usize,
}

/// One line of the consolidated metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    Train(TrainRecord),
    Test(TestRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_is_tagged_and_flat() {
        let line = serde_json::to_value(LogRecord::Train(TrainRecord {
            epoch: 3, train_loss: 0.5, train_acc: 81.25,
        })).unwrap();
        assert_eq!(line["kind"], "train");
        assert_eq!(line["epoch"], 3);
        assert_eq!(line["train_acc"], 81.25);
    }

    #[test]
    fn test_disabled_frequency_serialises_as_null() {
        let rec = TestRecord { epoch: 0, test_loss: 1.0, test_acc: 10.0, fre: None };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v["fre"].is_null());
    }
}
