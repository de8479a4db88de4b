use crate::{
    layer::{NetError, NetLayerBase},
    net::Net,
};

/// One layer's buffers for a single time step.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerState {
    pub weighted_sums: Vec<f64>,
    pub outputs: Vec<f64>,
}

impl LayerState {
    pub fn new(size: usize) -> Self {
        LayerState {
            weighted_sums: vec![0.0; size],
            outputs: vec![0.0; size],
        }
    }
}

/// The whole net's buffers for a single time step. Layer `i` reads its input from the
/// outputs of layer `i - 1`, or from `input` for the first layer.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkState {
    input: Vec<f64>,
    layers: Vec<LayerState>,
}

impl NetworkState {

    /// All-zero state, as seen by the first frame of a sequence.
    pub fn new(net: &Net) -> Self {
        NetworkState {
            input: vec![0.0; net.input_size()],
            layers: net.layer_iter()
                .map(|layer| LayerState::new(layer.output_size()))
                .collect(),
        }
    }

    #[inline]
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, index: usize) -> &LayerState {
        &self.layers[index]
    }

    /// The input seen by layer `index` at this step.
    #[inline]
    pub fn layer_inputs(&self, index: usize) -> &[f64] {
        if index == 0 {
            &self.input
        } else {
            &self.layers[index - 1].outputs
        }
    }

    #[inline]
    pub fn output(&self) -> &[f64] {
        &self.layers[self.layers.len() - 1].outputs
    }

    /// Runs every layer in order for this step, with `last` holding the previous step.
    pub fn feed_forward(&mut self, net: &Net, input: &[f64], last: &NetworkState) -> Result<(), NetError> {
        assert_eq!(input.len(), self.input.len());
        assert_eq!(net.num_layers(), self.layers.len());
        self.input.copy_from_slice(input);
        for (index, layer) in net.layer_iter().enumerate() {
            let (below, rest) = self.layers.split_at_mut(index);
            let inputs = match below.last() {
                Some(state) => &state.outputs[..],
                None => &self.input[..],
            };
            layer.feed_forward(inputs, &last.layers[index], &mut rest[0])?;
        }
        Ok(())
    }

}

/// Per-sample arena of network states. Index 0 is the all-zero initial state, index `t >= 1`
/// belongs to frame `t - 1`, and step `t` refers to its predecessor only by index.
#[derive(Clone, Debug)]
pub struct StateSequence {
    states: Vec<NetworkState>,
}

impl StateSequence {

    pub fn new(net: &Net) -> Self {
        Self::with_capacity(net, 0)
    }

    pub fn with_capacity(net: &Net, frames: usize) -> Self {
        let mut states = Vec::with_capacity(frames + 1);
        states.push(NetworkState::new(net));
        StateSequence { states }
    }

    /// Feeds one more frame through the net, chained onto the current last step.
    pub fn push_frame(&mut self, net: &Net, input: &[f64]) -> Result<&NetworkState, NetError> {
        let mut state = NetworkState::new(net);
        {
            let last = &self.states[self.states.len() - 1];
            state.feed_forward(net, input, last)?;
        }
        self.states.push(state);
        Ok(&self.states[self.states.len() - 1])
    }

    /// Number of steps including the initial state.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.states.len() - 1
    }

    #[inline]
    pub fn get(&self, step: usize) -> &NetworkState {
        &self.states[step]
    }

    /// The step before `step` and `step` itself.
    #[inline]
    pub fn last_and_now(&self, step: usize) -> (&NetworkState, &NetworkState) {
        assert!(step >= 1 && step < self.states.len());
        (&self.states[step - 1], &self.states[step])
    }

    /// The first output unit for every frame, in time order.
    pub fn frame_outputs<'a>(&'a self) -> impl Iterator<Item = f64> + 'a {
        self.states[1..].iter().map(|state| state.output()[0])
    }

}

#[cfg(test)]
mod test {
    use super::*;
    use crate::func::ActivationFn;
    use crate::initializer::{WeightInitializer, WeightInitMethod};
    use crate::net::NetConfig;

    fn net() -> Net {
        let mut init = WeightInitializer::new(WeightInitMethod::Linear, 1.0, 9);
        NetConfig::new_recurrent(3, [2], ActivationFn::default()).create_net(&mut init)
    }

    #[test]
    fn test_sequence_chaining() {
        let net = net();
        let mut sequence = StateSequence::new(&net);
        assert_eq!(sequence.len(), 1);
        assert!(sequence.get(0).output().iter().all(|&v| v == 0.0));

        sequence.push_frame(&net, &[1.0, 0.0, 0.5]).unwrap();
        sequence.push_frame(&net, &[1.0, 0.0, 0.5]).unwrap();
        assert_eq!(sequence.num_frames(), 2);
        assert_eq!(sequence.get(2).input(), &[1.0, 0.0, 0.5]);
        assert_eq!(sequence.get(2).layer_inputs(1), &sequence.get(2).layer(0).outputs[..]);

        // same input, different recurrent history
        assert_ne!(sequence.get(1).layer(0).weighted_sums, sequence.get(2).layer(0).weighted_sums);
        assert_eq!(sequence.frame_outputs().count(), 2);

        let (last, now) = sequence.last_and_now(2);
        assert_eq!(last, sequence.get(1));
        assert_eq!(now, sequence.get(2));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let net = net();
        let mut sequence = StateSequence::new(&net);
        match sequence.push_frame(&net, &[f64::NAN, 0.0, 0.0]) {
            Err(NetError::InvalidValue(_, _)) => {},
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert_eq!(sequence.num_frames(), 0);
    }

}
