pub mod math;
mod recurrent;
mod feed_forward;

pub use self::{
    recurrent::*,
    feed_forward::*,
};

use crate::{
    func::ActivationFn,
    initializer::WeightInitializer,
    state::LayerState,
};

quick_error! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum NetError {
        InvalidValue(unit: usize, weighted_sum: f64) {
            description("Non-finite activation output")
            display("Non-finite activation output at unit {} (weighted sum {})", unit, weighted_sum)
        }
    }
}

pub trait NetLayerBase {
    type TrainingState;

    fn feed_forward(&self, inputs: &[f64], last: &LayerState, now: &mut LayerState) -> Result<(), NetError>;
    /// One BPTT step. On entry `training` holds dE/d(outputs) for step `now`; `input_errors`
    /// receives the error for the layer below.
    fn back_propagate(&self, inputs: &[f64], last: &LayerState, now: &LayerState,
                      training: &mut Self::TrainingState, input_errors: &mut [f64]);
    fn apply_weight_changes(&mut self, training: &Self::TrainingState, learning_coefficient: f64);
    fn new_training_state(&self) -> Self::TrainingState;
    fn input_size(&self) -> usize;
    fn output_size(&self) -> usize;
    fn weight_buffer_size(&self) -> usize;
    fn write_weights_into(&self, target: &mut [f64]);
    fn read_weights_from(&mut self, source: &[f64]);
    fn sum_absolute_weight(&self) -> f64;
    fn weight_count(&self) -> usize {
        self.weight_buffer_size()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NetLayerConfig {
    Recurrent(usize, ActivationFn),
    FeedForward(usize, ActivationFn),
}

impl NetLayerConfig {
    pub fn create_layer(&self, input_size: usize, initializer: &mut WeightInitializer) -> NetLayer {
        match self {
            &NetLayerConfig::Recurrent(size, activation_fn) => {
                NetLayer::Recurrent(RecurrentLayer::new(input_size, size, activation_fn, initializer))
            },
            &NetLayerConfig::FeedForward(size, activation_fn) => {
                NetLayer::FeedForward(FeedForwardLayer::new(input_size, size, activation_fn, initializer))
            },
        }
    }
}

#[derive(Clone, Debug)]
pub enum NetLayer {
    Recurrent(RecurrentLayer),
    FeedForward(FeedForwardLayer),
}

/// Backward-pass buffers, index-matched with the layers of a net.
#[derive(Clone, Debug)]
pub enum LayerTrainingState {
    Recurrent(RecurrentTrainingState),
    FeedForward(FeedForwardTrainingState),
}

impl LayerTrainingState {

    pub fn multiply_error(&mut self, factor: f64) {
        match self {
            LayerTrainingState::Recurrent(state) => state.multiply_error(factor),
            LayerTrainingState::FeedForward(state) => state.multiply_error(factor),
        }
    }

    pub fn errors(&self) -> &[f64] {
        match self {
            LayerTrainingState::Recurrent(state) => &state.errors,
            LayerTrainingState::FeedForward(state) => &state.errors,
        }
    }

    pub fn errors_mut(&mut self) -> &mut [f64] {
        match self {
            LayerTrainingState::Recurrent(state) => &mut state.errors,
            LayerTrainingState::FeedForward(state) => &mut state.errors,
        }
    }

    pub fn write_gradients_into(&self, target: &mut [f64]) {
        match self {
            LayerTrainingState::Recurrent(state) => state.write_gradients_into(target),
            LayerTrainingState::FeedForward(state) => state.write_gradients_into(target),
        }
    }

}

impl NetLayer {

    pub fn get_config(&self) -> NetLayerConfig {
        match self {
            NetLayer::Recurrent(layer) => NetLayerConfig::Recurrent(layer.output_size(), layer.activation_fn()),
            NetLayer::FeedForward(layer) => NetLayerConfig::FeedForward(layer.output_size(), layer.activation_fn()),
        }
    }

    #[inline]
    pub fn is_recurrent(&self) -> bool {
        match self {
            NetLayer::Recurrent(_) => true,
            NetLayer::FeedForward(_) => false,
        }
    }

}

fn mismatched_training_state() -> ! {
    panic!("training state does not match the kind of its layer")
}

impl NetLayerBase for NetLayer {

    type TrainingState = LayerTrainingState;

    fn feed_forward(&self, inputs: &[f64], last: &LayerState, now: &mut LayerState) -> Result<(), NetError> {
        match self {
            NetLayer::Recurrent(layer) => layer.feed_forward(inputs, last, now),
            NetLayer::FeedForward(layer) => layer.feed_forward(inputs, last, now),
        }
    }

    fn back_propagate(&self, inputs: &[f64], last: &LayerState, now: &LayerState,
                      training: &mut LayerTrainingState, input_errors: &mut [f64]) {
        match (self, training) {
            (NetLayer::Recurrent(layer), LayerTrainingState::Recurrent(state)) =>
                layer.back_propagate(inputs, last, now, state, input_errors),
            (NetLayer::FeedForward(layer), LayerTrainingState::FeedForward(state)) =>
                layer.back_propagate(inputs, last, now, state, input_errors),
            _ => mismatched_training_state(),
        }
    }

    fn apply_weight_changes(&mut self, training: &LayerTrainingState, learning_coefficient: f64) {
        match (self, training) {
            (NetLayer::Recurrent(layer), LayerTrainingState::Recurrent(state)) =>
                layer.apply_weight_changes(state, learning_coefficient),
            (NetLayer::FeedForward(layer), LayerTrainingState::FeedForward(state)) =>
                layer.apply_weight_changes(state, learning_coefficient),
            _ => mismatched_training_state(),
        }
    }

    fn new_training_state(&self) -> LayerTrainingState {
        match self {
            NetLayer::Recurrent(layer) => LayerTrainingState::Recurrent(layer.new_training_state()),
            NetLayer::FeedForward(layer) => LayerTrainingState::FeedForward(layer.new_training_state()),
        }
    }

    fn input_size(&self) -> usize {
        match self {
            NetLayer::Recurrent(layer) => layer.input_size(),
            NetLayer::FeedForward(layer) => layer.input_size(),
        }
    }

    fn output_size(&self) -> usize {
        match self {
            NetLayer::Recurrent(layer) => layer.output_size(),
            NetLayer::FeedForward(layer) => layer.output_size(),
        }
    }

    fn weight_buffer_size(&self) -> usize {
        match self {
            NetLayer::Recurrent(layer) => layer.weight_buffer_size(),
            NetLayer::FeedForward(layer) => layer.weight_buffer_size(),
        }
    }

    fn write_weights_into(&self, target: &mut [f64]) {
        match self {
            NetLayer::Recurrent(layer) => layer.write_weights_into(target),
            NetLayer::FeedForward(layer) => layer.write_weights_into(target),
        }
    }

    fn read_weights_from(&mut self, source: &[f64]) {
        match self {
            NetLayer::Recurrent(layer) => layer.read_weights_from(source),
            NetLayer::FeedForward(layer) => layer.read_weights_from(source),
        }
    }

    fn sum_absolute_weight(&self) -> f64 {
        match self {
            NetLayer::Recurrent(layer) => layer.sum_absolute_weight(),
            NetLayer::FeedForward(layer) => layer.sum_absolute_weight(),
        }
    }
}
