use std::fmt;

use crate::{
    data::{TrainingFrame, TrainingSample},
    state::StateSequence,
};

/// Outputs at or above this value count as a detected onset.
pub const DETECTION_THRESHOLD: f64 = 0.25;
/// Maximum distance, in seconds, between a detection and the annotated onset it claims.
pub const MATCHING_TOLERANCE: f64 = 0.025;

/// Precision/recall counts accumulated over any number of samples until `reset`.
#[derive(Clone, Default)]
pub struct OnsetScorer {
    true_positives: u32,
    false_positives: u32,
    false_negatives: u32,
}

impl fmt::Debug for OnsetScorer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), std::fmt::Error> {
        f.debug_struct("OnsetScorer")
            .field("true_positives", &self.true_positives)
            .field("false_positives", &self.false_positives)
            .field("false_negatives", &self.false_negatives)
            .field("precision", &self.precision())
            .field("recall", &self.recall())
            .finish()
    }
}

impl OnsetScorer {

    pub fn new() -> Self {
        OnsetScorer::default()
    }

    pub fn score(&mut self, sequence: &StateSequence, sample: &TrainingSample) {
        debug_assert_eq!(sequence.num_frames(), sample.frames.len());
        self.score_outputs(sequence.frame_outputs(), sample);
    }

    /// Scores one output per frame of `sample`. Detections are matched in time order against
    /// the first unclaimed onset within tolerance, which is not necessarily the nearest one.
    pub fn score_outputs(&mut self, outputs: impl IntoIterator<Item = f64>, sample: &TrainingSample) {
        let mut available: Vec<&TrainingFrame> = sample.onsets().collect();

        for (output, frame) in outputs.into_iter().zip(sample.frames.iter()) {
            if output < DETECTION_THRESHOLD {
                continue;
            }
            let time = frame.frame.start;
            let matched = available.iter()
                .position(|onset| (onset.frame.start - time).abs() < MATCHING_TOLERANCE);
            match matched {
                Some(index) => {
                    available.remove(index);
                    self.true_positives += 1;
                },
                None => self.false_positives += 1,
            }
        }
        self.false_negatives += available.len() as u32;
    }

    pub fn reset(&mut self) {
        self.true_positives = 0;
        self.false_positives = 0;
        self.false_negatives = 0;
    }

    #[inline]
    pub fn true_positives(&self) -> u32 {
        self.true_positives
    }

    #[inline]
    pub fn false_positives(&self) -> u32 {
        self.false_positives
    }

    #[inline]
    pub fn false_negatives(&self) -> u32 {
        self.false_negatives
    }

    /// NaN when nothing was detected.
    pub fn precision(&self) -> f64 {
        self.true_positives as f64 / (self.true_positives + self.false_positives) as f64
    }

    /// NaN when there were no annotated onsets.
    pub fn recall(&self) -> f64 {
        self.true_positives as f64 / (self.true_positives + self.false_negatives) as f64
    }

    pub fn f_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        2.0 * precision * recall / (precision + recall)
    }

}

impl ToString for OnsetScorer {
    fn to_string(&self) -> String {
        format!("[f = {:.4}, recall = {:.4}, precision = {:.4}]",
            self.f_score(),
            self.recall(),
            self.precision()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample(frames: &[(f64, bool)]) -> TrainingSample {
        TrainingSample::new("test", frames.iter()
            .map(|&(start, is_onset)| TrainingFrame::new(start, start + 0.01, vec![0.0], is_onset))
            .collect())
    }

    #[test]
    fn test_matching() {
        let sample = sample(&[(1.0, true), (1.01, false), (2.0, true), (3.0, false)]);
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![0.0, 0.9, 0.1, 0.9], &sample);
        assert_eq!(scorer.true_positives(), 1);
        assert_eq!(scorer.false_positives(), 1);
        assert_eq!(scorer.false_negatives(), 1);
        assert_eq!(scorer.precision(), 0.5);
        assert_eq!(scorer.recall(), 0.5);
        assert_eq!(scorer.f_score(), 0.5);
    }

    #[test]
    fn test_onset_claimed_once() {
        let sample = sample(&[(1.0, true), (1.01, false), (1.02, false)]);
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![0.3, 0.3, 0.3], &sample);
        assert_eq!(scorer.true_positives(), 1);
        assert_eq!(scorer.false_positives(), 2);
        assert_eq!(scorer.false_negatives(), 0);
    }

    #[test]
    fn test_first_within_tolerance_wins() {
        // the detection at 1.015 claims 1.0 even though 1.02 is nearer
        let sample = sample(&[(1.0, true), (1.015, false), (1.02, true)]);
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![0.0, 1.0, 0.0], &sample);
        assert_eq!(scorer.true_positives(), 1);
        assert_eq!(scorer.false_negatives(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let sample = sample(&[(0.5, true)]);
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![DETECTION_THRESHOLD], &sample);
        assert_eq!(scorer.true_positives(), 1);
    }

    #[test]
    fn test_undefined_scores_are_nan() {
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![0.0, 0.0], &sample(&[(0.0, false), (1.0, false)]));
        assert!(scorer.precision().is_nan());
        assert!(scorer.recall().is_nan());
        assert!(scorer.f_score().is_nan());

        scorer.score_outputs(vec![0.0], &sample(&[(0.0, true)]));
        assert_eq!(scorer.recall(), 0.0);
        assert!(scorer.precision().is_nan());
        assert!(scorer.f_score().is_nan());
    }

    #[test]
    fn test_accumulates_until_reset() {
        let sample = sample(&[(1.0, true)]);
        let mut scorer = OnsetScorer::new();
        scorer.score_outputs(vec![1.0], &sample);
        scorer.score_outputs(vec![0.0], &sample);
        assert_eq!(scorer.true_positives(), 1);
        assert_eq!(scorer.false_negatives(), 1);
        scorer.reset();
        assert_eq!((scorer.true_positives(), scorer.false_positives(), scorer.false_negatives()), (0, 0, 0));
    }

}
