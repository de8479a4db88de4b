use std::fmt;

use crate::{
    buffer::Matrix,
    func::ActivationFn,
    initializer::WeightInitializer,
    layer::{math, NetError, NetLayerBase},
    state::LayerState,
};

/// A layer without self-recurrence; used as the output layer producing the onset score.
#[derive(Clone)]
pub struct FeedForwardLayer {
    input_size: usize,
    size: usize,
    bias_weights: Vec<f64>,
    input_weights: Matrix,
    activation_fn: ActivationFn,
}

impl fmt::Debug for FeedForwardLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("FeedForwardLayer")
            .field("input_size", &self.input_size)
            .field("size", &self.size)
            .field("activation_fn", &self.activation_fn)
            .finish()
    }
}

impl FeedForwardLayer {

    pub fn new(
        input_size: usize,
        size: usize,
        activation_fn: ActivationFn,
        initializer: &mut WeightInitializer,
    ) -> Self {
        assert!(input_size > 0 && size > 0);
        let fan_in = input_size + 1;
        let mut bias_weights = vec![0.0; size];
        initializer.randomise(&mut bias_weights, fan_in);
        let mut input_weights = Matrix::new(input_size, size);
        initializer.randomise(input_weights.as_mut_slice(), fan_in);
        FeedForwardLayer {
            input_size,
            size,
            bias_weights,
            input_weights,
            activation_fn,
        }
    }

    #[inline]
    pub fn activation_fn(&self) -> ActivationFn {
        self.activation_fn
    }

}

#[derive(Clone, Debug)]
pub struct FeedForwardTrainingState {
    pub errors: Vec<f64>,
    pub bias_weight_errors: Vec<f64>,
    pub input_weight_errors: Matrix,
}

impl FeedForwardTrainingState {

    pub fn new(input_size: usize, size: usize) -> Self {
        FeedForwardTrainingState {
            errors: vec![0.0; size],
            bias_weight_errors: vec![0.0; size],
            input_weight_errors: Matrix::new(input_size, size),
        }
    }

    pub fn multiply_error(&mut self, factor: f64) {
        math::multiply(&mut self.bias_weight_errors, factor);
        math::multiply(self.input_weight_errors.as_mut_slice(), factor);
        for error in self.errors.iter_mut() {
            *error = 0.0;
        }
    }

    pub fn write_gradients_into(&self, target: &mut [f64]) {
        math::write_parts_into(&[self.input_weight_errors.as_slice(), &self.bias_weight_errors[..]], target);
    }

}

impl NetLayerBase for FeedForwardLayer {

    type TrainingState = FeedForwardTrainingState;

    fn feed_forward(&self, inputs: &[f64], _last: &LayerState, now: &mut LayerState) -> Result<(), NetError> {
        debug_assert_eq!(inputs.len(), self.input_size);

        let weighted_sums = &mut now.weighted_sums;
        for sum in weighted_sums.iter_mut() {
            *sum = 0.0;
        }
        math::sum(&self.bias_weights, weighted_sums);
        math::weighted_input_sum(inputs, &self.input_weights, weighted_sums);
        math::output_from_activation(&self.activation_fn, weighted_sums, &mut now.outputs)
    }

    fn back_propagate(
        &self,
        inputs: &[f64],
        _last: &LayerState,
        now: &LayerState,
        state: &mut FeedForwardTrainingState,
        input_errors: &mut [f64],
    ) {
        math::multiply_by_activation_derivative(&self.activation_fn, &now.weighted_sums, &mut state.errors);

        for error in input_errors.iter_mut() {
            *error = 0.0;
        }
        math::weighted_output_sum(&state.errors, &self.input_weights, input_errors);

        math::sum(&state.errors, &mut state.bias_weight_errors);
        math::sum_products(inputs, &state.errors, &mut state.input_weight_errors);
    }

    fn apply_weight_changes(&mut self, state: &FeedForwardTrainingState, learning_coefficient: f64) {
        math::apply_weight_changes(&mut self.bias_weights, &state.bias_weight_errors, learning_coefficient);
        math::apply_matrix_weight_changes(&mut self.input_weights, &state.input_weight_errors, learning_coefficient);
    }

    fn new_training_state(&self) -> FeedForwardTrainingState {
        FeedForwardTrainingState::new(self.input_size, self.size)
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn weight_buffer_size(&self) -> usize {
        self.input_weights.len() + self.bias_weights.len()
    }

    fn write_weights_into(&self, target: &mut [f64]) {
        math::write_parts_into(&[self.input_weights.as_slice(), &self.bias_weights[..]], target);
    }

    fn read_weights_from(&mut self, source: &[f64]) {
        debug_assert_eq!(source.len(), self.weight_buffer_size());
        let (input, bias) = source.split_at(self.input_weights.len());
        self.input_weights.as_mut_slice().copy_from_slice(input);
        self.bias_weights.copy_from_slice(bias);
    }

    fn sum_absolute_weight(&self) -> f64 {
        math::sum_absolute(self.input_weights.as_slice()) + math::sum_absolute(&self.bias_weights)
    }

}

#[cfg(test)]
mod test {
    use super::*;
    use crate::initializer::WeightInitMethod;

    #[test]
    fn test_single_step_backprop() {
        let mut init = WeightInitializer::new(WeightInitMethod::Linear, 1.0, 0);
        let mut layer = FeedForwardLayer::new(2, 1, ActivationFn::Tanh, &mut init);
        layer.read_weights_from(&[0.5, -0.5, 0.1]);

        let inputs = [1.0, 0.5];
        let mut now = LayerState::new(1);
        layer.feed_forward(&inputs, &LayerState::new(1), &mut now).unwrap();
        let weighted_sum = 0.1 + 0.5 - 0.25;
        assert!((now.weighted_sums[0] - weighted_sum).abs() < 1e-12);

        let mut state = layer.new_training_state();
        state.errors[0] = 2.0;
        let mut input_errors = vec![9.0, 9.0];
        layer.back_propagate(&inputs, &LayerState::new(1), &now, &mut state, &mut input_errors);

        let delta = 2.0 * (1.0 - weighted_sum.tanh().powi(2));
        assert!((state.errors[0] - delta).abs() < 1e-12);
        assert!((input_errors[0] - 0.5 * delta).abs() < 1e-12);
        assert!((input_errors[1] + 0.5 * delta).abs() < 1e-12);

        let mut gradients = vec![0.0; 3];
        state.write_gradients_into(&mut gradients);
        assert!((gradients[0] - delta).abs() < 1e-12);
        assert!((gradients[1] - 0.5 * delta).abs() < 1e-12);
        assert!((gradients[2] - delta).abs() < 1e-12);

        layer.apply_weight_changes(&state, 0.1);
        let mut weights = vec![0.0; 3];
        layer.write_weights_into(&mut weights);
        assert!((weights[2] - (0.1 - 0.1 * delta)).abs() < 1e-12);
    }

}
