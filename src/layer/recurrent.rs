use std::fmt;

use crate::{
    buffer::Matrix,
    func::ActivationFn,
    initializer::WeightInitializer,
    layer::{math, NetError, NetLayerBase},
    state::LayerState,
};

/// A layer whose previous output is fed back into itself through `internal_weights`.
#[derive(Clone)]
pub struct RecurrentLayer {
    input_size: usize,
    size: usize,
    bias_weights: Vec<f64>,
    input_weights: Matrix,
    internal_weights: Matrix,
    activation_fn: ActivationFn,
}

impl fmt::Debug for RecurrentLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("RecurrentLayer")
            .field("input_size", &self.input_size)
            .field("size", &self.size)
            .field("activation_fn", &self.activation_fn)
            .finish()
    }
}

impl RecurrentLayer {

    pub fn new(
        input_size: usize,
        size: usize,
        activation_fn: ActivationFn,
        initializer: &mut WeightInitializer,
    ) -> Self {
        assert!(input_size > 0 && size > 0);
        let fan_in = input_size + size + 1;
        let mut bias_weights = vec![0.0; size];
        initializer.randomise(&mut bias_weights, fan_in);
        let mut input_weights = Matrix::new(input_size, size);
        initializer.randomise(input_weights.as_mut_slice(), fan_in);
        let mut internal_weights = Matrix::new(size, size);
        initializer.randomise(internal_weights.as_mut_slice(), fan_in);
        RecurrentLayer {
            input_size,
            size,
            bias_weights,
            input_weights,
            internal_weights,
            activation_fn,
        }
    }

    #[inline]
    pub fn activation_fn(&self) -> ActivationFn {
        self.activation_fn
    }

}

/// Backward-pass buffers for one recurrent layer, reused for every time step and sample.
#[derive(Clone, Debug)]
pub struct RecurrentTrainingState {
    /// dE/d(output) on entry to a step, dE/d(weighted sum) once the step is done.
    pub errors: Vec<f64>,
    /// The finalised errors of the step after the one being processed.
    pub internal_errors: Vec<f64>,
    pub bias_weight_errors: Vec<f64>,
    pub input_weight_errors: Matrix,
    pub internal_weight_errors: Matrix,
}

impl RecurrentTrainingState {

    pub fn new(input_size: usize, size: usize) -> Self {
        RecurrentTrainingState {
            errors: vec![0.0; size],
            internal_errors: vec![0.0; size],
            bias_weight_errors: vec![0.0; size],
            input_weight_errors: Matrix::new(input_size, size),
            internal_weight_errors: Matrix::new(size, size),
        }
    }

    /// Scales the accumulated weight gradients and clears the errors carried between steps.
    pub fn multiply_error(&mut self, factor: f64) {
        math::multiply(&mut self.bias_weight_errors, factor);
        math::multiply(self.input_weight_errors.as_mut_slice(), factor);
        math::multiply(self.internal_weight_errors.as_mut_slice(), factor);
        for error in self.errors.iter_mut().chain(self.internal_errors.iter_mut()) {
            *error = 0.0;
        }
    }

    pub fn write_gradients_into(&self, target: &mut [f64]) {
        math::write_parts_into(
            &[self.input_weight_errors.as_slice(), self.internal_weight_errors.as_slice(), &self.bias_weight_errors[..]],
            target,
        );
    }

}

impl NetLayerBase for RecurrentLayer {

    type TrainingState = RecurrentTrainingState;

    fn feed_forward(&self, inputs: &[f64], last: &LayerState, now: &mut LayerState) -> Result<(), NetError> {
        debug_assert_eq!(inputs.len(), self.input_size);

        let weighted_sums = &mut now.weighted_sums;
        for sum in weighted_sums.iter_mut() {
            *sum = 0.0;
        }
        math::sum(&self.bias_weights, weighted_sums);
        math::weighted_input_sum(inputs, &self.input_weights, weighted_sums);
        math::weighted_input_sum(&last.outputs, &self.internal_weights, weighted_sums);
        math::output_from_activation(&self.activation_fn, weighted_sums, &mut now.outputs)
    }

    fn back_propagate(
        &self,
        inputs: &[f64],
        last: &LayerState,
        now: &LayerState,
        state: &mut RecurrentTrainingState,
        input_errors: &mut [f64],
    ) {
        // state.errors holds dE/d(outputs) from the layer above; add the error arriving from the
        // next time step through the same recurrent weights that carried the signal forward
        math::weighted_output_sum(&state.internal_errors, &self.internal_weights, &mut state.errors);

        math::multiply_by_activation_derivative(&self.activation_fn, &now.weighted_sums, &mut state.errors);

        for error in input_errors.iter_mut() {
            *error = 0.0;
        }
        math::weighted_output_sum(&state.errors, &self.input_weights, input_errors);

        // becomes the error from the future as we step back to t - 1
        state.internal_errors.copy_from_slice(&state.errors);

        math::sum(&state.errors, &mut state.bias_weight_errors);
        math::sum_products(inputs, &state.errors, &mut state.input_weight_errors);
        math::sum_products(&last.outputs, &state.errors, &mut state.internal_weight_errors);
    }

    fn apply_weight_changes(&mut self, state: &RecurrentTrainingState, learning_coefficient: f64) {
        math::apply_weight_changes(&mut self.bias_weights, &state.bias_weight_errors, learning_coefficient);
        math::apply_matrix_weight_changes(&mut self.input_weights, &state.input_weight_errors, learning_coefficient);
        math::apply_matrix_weight_changes(&mut self.internal_weights, &state.internal_weight_errors, learning_coefficient);
    }

    fn new_training_state(&self) -> RecurrentTrainingState {
        RecurrentTrainingState::new(self.input_size, self.size)
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn weight_buffer_size(&self) -> usize {
        self.input_weights.len() + self.internal_weights.len() + self.bias_weights.len()
    }

    fn write_weights_into(&self, target: &mut [f64]) {
        math::write_parts_into(
            &[self.input_weights.as_slice(), self.internal_weights.as_slice(), &self.bias_weights[..]],
            target,
        );
    }

    fn read_weights_from(&mut self, source: &[f64]) {
        debug_assert_eq!(source.len(), self.weight_buffer_size());
        let (input, rest) = source.split_at(self.input_weights.len());
        let (internal, bias) = rest.split_at(self.internal_weights.len());
        self.input_weights.as_mut_slice().copy_from_slice(input);
        self.internal_weights.as_mut_slice().copy_from_slice(internal);
        self.bias_weights.copy_from_slice(bias);
    }

    fn sum_absolute_weight(&self) -> f64 {
        math::sum_absolute(self.input_weights.as_slice())
            + math::sum_absolute(self.internal_weights.as_slice())
            + math::sum_absolute(&self.bias_weights)
    }

}
