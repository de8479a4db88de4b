use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{config::NetworkConfiguration, score::OnsetScorer};

quick_error! {
    #[derive(Debug)]
    pub enum MetricsError {
        Io(err: io::Error) {
            from()
            description("IO error writing metrics")
            display("IO error writing metrics: {}", err)
        }
        Csv(err: csv::Error) {
            from()
            description("CSV error writing metrics")
            display("CSV error writing metrics: {}", err)
        }
    }
}

pub const EPOCH_HEADER: [&str; 12] = [
    "timestamp",
    "epoch",
    "mean_absolute_weight",
    "train_f_score",
    "train_recall",
    "train_precision",
    "validation_f_score",
    "validation_recall",
    "validation_precision",
    "test_f_score",
    "test_recall",
    "test_precision",
];

/// One row per completed epoch. Scores are NaN where undefined.
#[derive(Clone, Debug, Serialize)]
pub struct EpochMetrics {
    pub timestamp: DateTime<Local>,
    pub epoch: usize,
    pub mean_absolute_weight: f64,
    pub train_f_score: f64,
    pub train_recall: f64,
    pub train_precision: f64,
    pub validation_f_score: f64,
    pub validation_recall: f64,
    pub validation_precision: f64,
    pub test_f_score: f64,
    pub test_recall: f64,
    pub test_precision: f64,
}

impl EpochMetrics {

    pub fn new(
        epoch: usize,
        mean_absolute_weight: f64,
        train: &OnsetScorer,
        validation: &OnsetScorer,
        test: &OnsetScorer,
    ) -> Self {
        EpochMetrics {
            timestamp: Local::now(),
            epoch,
            mean_absolute_weight,
            train_f_score: train.f_score(),
            train_recall: train.recall(),
            train_precision: train.precision(),
            validation_f_score: validation.f_score(),
            validation_recall: validation.recall(),
            validation_precision: validation.precision(),
            test_f_score: test.f_score(),
            test_recall: test.recall(),
            test_precision: test.precision(),
        }
    }

}

/// Receives the progress of one evaluation run.
pub trait MetricsSink {
    fn write_configuration(&mut self, config: &NetworkConfiguration) -> Result<(), MetricsError>;

    fn write_epoch(&mut self, metrics: &EpochMetrics) -> Result<(), MetricsError>;

    fn write_abort(&mut self, message: &str) -> Result<(), MetricsError>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn write_configuration(&mut self, config: &NetworkConfiguration) -> Result<(), MetricsError> {
        (**self).write_configuration(config)
    }

    fn write_epoch(&mut self, metrics: &EpochMetrics) -> Result<(), MetricsError> {
        (**self).write_epoch(metrics)
    }

    fn write_abort(&mut self, message: &str) -> Result<(), MetricsError> {
        (**self).write_abort(message)
    }
}

/// Writes `key,value` configuration rows, then a header and one row per epoch.
pub struct CsvMetricsSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvMetricsSink<W> {

    pub fn new(writer: W) -> Self {
        CsvMetricsSink {
            writer: csv::WriterBuilder::new()
                .flexible(true)
                .has_headers(false)
                .from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, MetricsError> {
        self.writer.into_inner()
            .map_err(|err| MetricsError::Io(err.into_error()))
    }

}

impl CsvMetricsSink<BufWriter<File>> {

    /// Creates `<dir>/<name>.csv`, creating `dir` as needed.
    pub fn create_in_dir(dir: impl AsRef<Path>, config: &NetworkConfiguration) -> Result<Self, MetricsError> {
        fs::create_dir_all(dir.as_ref())?;
        let file = File::create(dir.as_ref().join(format!("{}.csv", config.name)))?;
        Ok(CsvMetricsSink::new(BufWriter::new(file)))
    }

}

impl<W: Write> MetricsSink for CsvMetricsSink<W> {

    fn write_configuration(&mut self, config: &NetworkConfiguration) -> Result<(), MetricsError> {
        for (key, value) in config.entries() {
            self.writer.write_record(&[key, value.as_str()])?;
        }
        self.writer.write_record(&EPOCH_HEADER)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_epoch(&mut self, metrics: &EpochMetrics) -> Result<(), MetricsError> {
        self.writer.serialize(metrics)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_abort(&mut self, message: &str) -> Result<(), MetricsError> {
        let timestamp = Local::now().to_rfc3339();
        self.writer.write_record(&[timestamp, format!("Aborted {}", message)])?;
        self.writer.flush()?;
        Ok(())
    }

}

/// Keeps everything in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub configuration: Option<NetworkConfiguration>,
    pub epochs: Vec<EpochMetrics>,
    pub aborted: Option<String>,
}

impl MetricsSink for MemorySink {

    fn write_configuration(&mut self, config: &NetworkConfiguration) -> Result<(), MetricsError> {
        self.configuration = Some(config.clone());
        Ok(())
    }

    fn write_epoch(&mut self, metrics: &EpochMetrics) -> Result<(), MetricsError> {
        self.epochs.push(metrics.clone());
        Ok(())
    }

    fn write_abort(&mut self, message: &str) -> Result<(), MetricsError> {
        self.aborted = Some(message.to_string());
        Ok(())
    }

}
