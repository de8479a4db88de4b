use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use itertools::chain;

use crate::utils::first_duplicate;

quick_error! {
    #[derive(Debug)]
    pub enum DataError {
        ZeroFeatureColumns {
            description("Zero feature columns in dataset")
        }
        ColumnNotFound(name: String) {
            description("Column with specified name not found")
            display("Column with name {} not found", name)
        }
        DuplicateColumns(name: String) {
            description("Duplicate columns found in file")
            display("Duplicate columns found in file: {}", name)
        }
        ColumnCountMismatch(row: usize, count: usize, expected: usize) {
            description("Invalid number of columns, did not match header")
            display("Row {} has {} columns, header has {}", row, count, expected)
        }
        UnknownSplit(name: String) {
            description("Unknown dataset split")
            display("Unknown dataset split '{}', expected train, validation or test", name)
        }
        SplitMismatch(sample: String) {
            description("Sample assigned to more than one split")
            display("Sample {} is assigned to more than one split", sample)
        }
        NonContiguousSample(sample: String) {
            description("Rows of a sample are not contiguous")
            display("Rows of sample {} are not contiguous", sample)
        }
        InvalidValue(row: usize, column: String, value: String) {
            description("Invalid value in dataset")
            display("Row {}: invalid value '{}' in column {}", row, value, column)
        }
        FeatureWidthMismatch(sample: String, width: usize, expected: usize) {
            description("Frames have different feature widths")
            display("Sample {} has frames of width {}, expected {}", sample, width, expected)
        }
        Csv(err: csv::Error) {
            from()
            description("CSV error")
            display("CSV error: {}", err)
        }
    }
}

/// Features for one analysis window of audio.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub start: f64,
    pub end: f64,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingFrame {
    pub frame: Frame,
    pub is_onset: bool,
}

impl TrainingFrame {
    pub fn new(start: f64, end: f64, values: Vec<f64>, is_onset: bool) -> Self {
        TrainingFrame {
            frame: Frame { start, end, values },
            is_onset,
        }
    }
}

/// The frames of one audio clip, in time order.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSample {
    pub name: String,
    pub frames: Vec<TrainingFrame>,
}

impl TrainingSample {
    pub fn new(name: impl Into<String>, frames: Vec<TrainingFrame>) -> Self {
        TrainingSample {
            name: name.into(),
            frames,
        }
    }

    pub fn onsets<'a>(&'a self) -> impl Iterator<Item = &'a TrainingFrame> + 'a {
        self.frames.iter().filter(|frame| frame.is_onset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    Training,
    Validation,
    Testing,
}

impl FromStr for Split {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" | "training" => Ok(Split::Training),
            "validation" | "valid" => Ok(Split::Validation),
            "test" | "testing" => Ok(Split::Testing),
            _ => Err(DataError::UnknownSplit(s.to_string())),
        }
    }
}

/// Three disjoint, ordered collections of samples. Immutable once built.
#[derive(Clone, Debug)]
pub struct Dataset {
    training: Vec<TrainingSample>,
    validation: Vec<TrainingSample>,
    testing: Vec<TrainingSample>,
    feature_width: usize,
}

const SAMPLE_COLUMN: &str = "sample";
const SPLIT_COLUMN: &str = "split";
const START_COLUMN: &str = "start";
const END_COLUMN: &str = "end";
const ONSET_COLUMN: &str = "onset";

/// Accepts `true`/`false` in any case, or a number equal to 1 or 0.
fn parse_onset(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => match other.parse::<f64>().ok()? {
            v if v == 1.0 => Some(true),
            v if v == 0.0 => Some(false),
            _ => None,
        },
    }
}

impl Dataset {

    /// Every frame of every split must have the same, non-zero feature width.
    pub fn new(
        training: Vec<TrainingSample>,
        validation: Vec<TrainingSample>,
        testing: Vec<TrainingSample>,
    ) -> Result<Dataset, DataError> {
        let mut feature_width = None;
        for sample in chain(chain(&training, &validation), &testing) {
            for frame in &sample.frames {
                let width = frame.frame.values.len();
                match feature_width {
                    None => feature_width = Some(width),
                    Some(expected) if expected != width => {
                        return Err(DataError::FeatureWidthMismatch(sample.name.clone(), width, expected));
                    },
                    Some(_) => {},
                }
            }
        }
        match feature_width {
            None | Some(0) => Err(DataError::ZeroFeatureColumns),
            Some(feature_width) => Ok(Dataset {
                training,
                validation,
                testing,
                feature_width,
            }),
        }
    }

    /// Loads pre-computed frames. Required columns are `sample`, `split`, `start`, `end` and
    /// `onset`; every other column is a feature, in header order.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Dataset, DataError> {

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let column_names = reader.headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<String>>();

        if let Some(dupe) = first_duplicate(column_names.iter()) {
            return Err(DataError::DuplicateColumns(dupe.clone()));
        }

        let find = |name: &str| column_names.iter()
            .position(|n| n == name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()));
        let sample_index = find(SAMPLE_COLUMN)?;
        let split_index = find(SPLIT_COLUMN)?;
        let start_index = find(START_COLUMN)?;
        let end_index = find(END_COLUMN)?;
        let onset_index = find(ONSET_COLUMN)?;
        let required = [sample_index, split_index, start_index, end_index, onset_index];

        let feature_indices: Vec<usize> = (0..column_names.len())
            .filter(|i| !required.contains(i))
            .collect();
        if feature_indices.is_empty() {
            return Err(DataError::ZeroFeatureColumns);
        }

        let mut samples: Vec<(Split, TrainingSample)> = Vec::new();
        let mut seen = HashSet::new();

        for (row_index, row) in reader.records().enumerate() {
            let row = row?;
            // header is line 1
            let line = row_index + 2;
            if row.len() != column_names.len() {
                return Err(DataError::ColumnCountMismatch(line, row.len(), column_names.len()));
            }
            let parse = |index: usize| -> Result<f64, DataError> {
                row[index].parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| DataError::InvalidValue(line, column_names[index].clone(), row[index].to_string()))
            };

            let name = &row[sample_index];
            let split: Split = row[split_index].parse()?;
            let is_onset = parse_onset(&row[onset_index])
                .ok_or_else(|| DataError::InvalidValue(line, ONSET_COLUMN.to_string(), row[onset_index].to_string()))?;
            let values = feature_indices.iter()
                .map(|&i| parse(i))
                .collect::<Result<Vec<f64>, DataError>>()?;
            let frame = TrainingFrame::new(parse(start_index)?, parse(end_index)?, values, is_onset);

            if let Some((last_split, sample)) = samples.last_mut() {
                if sample.name == name {
                    if *last_split != split {
                        return Err(DataError::SplitMismatch(name.to_string()));
                    }
                    sample.frames.push(frame);
                    continue;
                }
            }
            if !seen.insert(name.to_string()) {
                return Err(DataError::NonContiguousSample(name.to_string()));
            }
            samples.push((split, TrainingSample::new(name, vec![frame])));
        }

        let mut training = Vec::new();
        let mut validation = Vec::new();
        let mut testing = Vec::new();
        for (split, sample) in samples {
            match split {
                Split::Training => training.push(sample),
                Split::Validation => validation.push(sample),
                Split::Testing => testing.push(sample),
            }
        }
        Dataset::new(training, validation, testing)
    }

    #[inline]
    pub fn training_samples(&self) -> &[TrainingSample] {
        &self.training
    }

    #[inline]
    pub fn validation_samples(&self) -> &[TrainingSample] {
        &self.validation
    }

    #[inline]
    pub fn testing_samples(&self) -> &[TrainingSample] {
        &self.testing
    }

    #[inline]
    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

}
