use crate::{
    config::NetworkConfiguration,
    data::TrainingSample,
    func::ErrorFn,
    layer::NetError,
    net::Net,
    score::OnsetScorer,
    state::StateSequence,
    train::NetworkTrainingState,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingOptions {
    pub learning_coefficient: f64,
    pub momentum: f64,
    /// Target output for frames labelled as onsets.
    pub detection_value: f64,
    /// Target output for every other frame.
    pub no_detection_value: f64,
    pub error_fn: ErrorFn,
}

impl TrainingOptions {

    pub fn from_configuration(config: &NetworkConfiguration) -> Self {
        TrainingOptions {
            learning_coefficient: config.learning_coefficient,
            momentum: config.momentum,
            detection_value: config.detection_value,
            no_detection_value: config.no_detection_value,
            error_fn: ErrorFn::default(),
        }
    }

    #[inline]
    pub fn target(&self, is_onset: bool) -> f64 {
        if is_onset { self.detection_value } else { self.no_detection_value }
    }

}

/// Trains a recurrent net one sample at a time: forward over every frame, back-propagate through
/// time from the last frame to the first, then apply the accumulated gradient once.
#[derive(Clone, Debug)]
pub struct RecurrentNetTrainer {
    net: Net,
    training_state: NetworkTrainingState,
    options: TrainingOptions,
}

impl RecurrentNetTrainer {

    pub fn new(net: Net, options: TrainingOptions) -> Self {
        let training_state = NetworkTrainingState::for_net(&net);
        RecurrentNetTrainer { net, training_state, options }
    }

    #[inline]
    pub fn net(&self) -> &Net {
        &self.net
    }

    #[inline]
    pub fn training_state(&self) -> &NetworkTrainingState {
        &self.training_state
    }

    pub fn into_net(self) -> Net {
        self.net
    }

    /// Runs the sample forward and scores it without touching weights or gradients.
    pub fn feed_forward(&self, sample: &TrainingSample, scorer: &mut OnsetScorer) -> Result<StateSequence, NetError> {
        let sequence = self.run_sequence(sample)?;
        scorer.score(&sequence, sample);
        Ok(sequence)
    }

    /// Forward pass followed by a full reverse pass. Returns the states and the loss summed over
    /// every frame; the gradient is left in the training state, not applied.
    pub fn accumulate_gradients(&mut self, sample: &TrainingSample) -> Result<(StateSequence, f64), NetError> {
        let sequence = self.run_sequence(sample)?;
        let options = self.options;
        let mut loss = 0.0;

        self.training_state.prepare(options.momentum);
        for step in (1..sequence.len()).rev() {
            let target = options.target(sample.frames[step - 1].is_onset);
            let (last, now) = sequence.last_and_now(step);
            for (error, &output) in self.training_state.output_errors_mut().iter_mut().zip(now.output()) {
                loss += options.error_fn.get_error(target, output);
                *error = options.error_fn.get_error_derivative(target, output);
            }
            self.training_state.back_propagate(&self.net, last, now);
        }

        Ok((sequence, loss))
    }

    /// One complete training pass over `sample`, scored on the pre-update outputs.
    pub fn train(&mut self, sample: &TrainingSample, scorer: &mut OnsetScorer) -> Result<f64, NetError> {
        let (sequence, loss) = self.accumulate_gradients(sample)?;
        scorer.score(&sequence, sample);
        self.training_state.apply_weight_changes(&mut self.net, self.options.learning_coefficient);
        Ok(loss)
    }

    fn run_sequence(&self, sample: &TrainingSample) -> Result<StateSequence, NetError> {
        let mut sequence = StateSequence::with_capacity(&self.net, sample.frames.len());
        for frame in sample.frames.iter() {
            sequence.push_frame(&self.net, &frame.frame.values)?;
        }
        Ok(sequence)
    }

}
