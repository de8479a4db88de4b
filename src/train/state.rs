use crate::{
    buffer::RowBuffer,
    layer::{LayerTrainingState, NetLayer, NetLayerBase},
    net::Net,
    state::NetworkState,
};

/// Gradient buffers for a whole net, allocated once and reused for every step and sample.
///
/// `prepare` is the only reset: gradient accumulators are scaled by the momentum (so zero
/// momentum clears them) and errors carried between steps are zeroed. `back_propagate` only ever
/// accumulates into them.
#[derive(Clone, Debug)]
pub struct NetworkTrainingState {
    layers: Vec<LayerTrainingState>,
    input_errors: Vec<f64>,
}

impl NetworkTrainingState {

    pub fn for_net(net: &Net) -> Self {
        NetworkTrainingState {
            layers: net.layer_iter()
                .map(NetLayer::new_training_state)
                .collect(),
            input_errors: vec![0.0; net.input_size()],
        }
    }

    /// Keeps `momentum` of the gradient accumulated over the previous sample.
    pub fn prepare(&mut self, momentum: f64) {
        for state in self.layers.iter_mut() {
            state.multiply_error(momentum);
        }
        for error in self.input_errors.iter_mut() {
            *error = 0.0;
        }
    }

    /// dE/d(output) of the final layer for the step about to be back-propagated.
    #[inline]
    pub fn output_errors_mut(&mut self) -> &mut [f64] {
        let last = self.layers.len() - 1;
        self.layers[last].errors_mut()
    }

    #[inline]
    pub fn layer(&self, index: usize) -> &LayerTrainingState {
        &self.layers[index]
    }

    /// One BPTT step, from the output layer down. Must be called for steps in reverse order.
    pub fn back_propagate(&mut self, net: &Net, last: &NetworkState, now: &NetworkState) {
        assert_eq!(net.num_layers(), self.layers.len());
        for index in (0..self.layers.len()).rev() {
            let (below, rest) = self.layers.split_at_mut(index);
            let input_errors = match below.last_mut() {
                Some(state) => state.errors_mut(),
                None => &mut self.input_errors[..],
            };
            net.layer(index).back_propagate(
                now.layer_inputs(index),
                last.layer(index),
                now.layer(index),
                &mut rest[0],
                input_errors,
            );
        }
    }

    pub fn apply_weight_changes(&self, net: &mut Net, learning_coefficient: f64) {
        assert_eq!(net.num_layers(), self.layers.len());
        for (layer, state) in net.layer_iter_mut().zip(self.layers.iter()) {
            layer.apply_weight_changes(state, learning_coefficient);
        }
    }

    /// Accumulated gradients laid out exactly like `Net::get_weights`.
    pub fn get_gradients(&self, net: &Net) -> RowBuffer {
        let mut buf = net.new_zeroed_weight_buffer();
        for (i, state) in self.layers.iter().enumerate() {
            state.write_gradients_into(buf.get_row_mut(i));
        }
        buf
    }

}
