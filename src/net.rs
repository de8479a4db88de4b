use core::slice;

use crate::{
    layer::{
        NetLayer,
        NetLayerBase,
        NetLayerConfig,
    },
    buffer::RowBuffer,
    initializer::WeightInitializer,
    func::ActivationFn,
};

#[derive(Clone, Debug, PartialEq)]
pub struct NetConfig {
    input_size: usize,
    layers: Vec<NetLayerConfig>,
}

impl NetConfig {

    /// A stack of recurrent layers topped by a single-unit feed-forward output layer.
    pub fn new_recurrent(
        input_size: usize,
        hidden_layer_sizes: impl AsRef<[usize]>,
        activation_fn: ActivationFn,
    ) -> Self {
        let hidden_layer_sizes = hidden_layer_sizes.as_ref();
        assert!(input_size > 0);
        let mut layers: Vec<NetLayerConfig> = Vec::with_capacity(hidden_layer_sizes.len() + 1);
        for layer_size in hidden_layer_sizes {
            assert!(*layer_size > 0);
            layers.push(NetLayerConfig::Recurrent(*layer_size, activation_fn));
        }
        layers.push(NetLayerConfig::FeedForward(1, activation_fn));
        NetConfig {
            input_size,
            layers
        }
    }

    /// Layers are created, and their weights drawn from `initializer`, in order.
    pub fn create_net(&self, initializer: &mut WeightInitializer) -> Net {

        assert!(self.input_size > 0);
        assert!(self.layers.len() > 0);

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut layer_input_size = self.input_size;
        for layer_config in &self.layers {
            let layer = layer_config.create_layer(layer_input_size, initializer);
            layer_input_size = layer.output_size();
            layers.push(layer);
        }
        Net {
            input_size: self.input_size,
            output_size: layer_input_size,
            layers
        }

    }

}

#[derive(Clone, Debug)]
pub struct Net {
    input_size: usize,
    output_size: usize,
    layers: Vec<NetLayer>,
}

impl Net {

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, index: usize) -> &NetLayer {
        &self.layers[index]
    }

    #[inline]
    pub fn layer_iter(&self) -> slice::Iter<NetLayer> {
        self.layers.iter()
    }

    #[inline]
    pub fn layer_iter_mut(&mut self) -> slice::IterMut<NetLayer> {
        self.layers.iter_mut()
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn store_weights_into(&self, buffer: &mut RowBuffer) {
        assert_eq!(buffer.num_rows(), self.layers.len());
        for i in 0..self.layers.len() {
            self.layers[i].write_weights_into(buffer.get_row_mut(i));
        }
    }

    pub fn load_weights_from(&mut self, buffer: &RowBuffer) {
        assert_eq!(buffer.num_rows(), self.layers.len());
        for i in 0..self.layers.len() {
            self.layers[i].read_weights_from(buffer.get_row(i));
        }
    }

    /// One row per layer, each `weight_buffer_size` long.
    pub fn new_zeroed_weight_buffer(&self) -> RowBuffer {
        let layer_sizes: Vec<usize> = self.layer_iter()
            .map(NetLayer::weight_buffer_size)
            .collect();
        RowBuffer::new_with_row_sizes(0.0, layer_sizes)
    }

    pub fn get_weights(&self) -> RowBuffer {
        let mut buf = self.new_zeroed_weight_buffer();
        self.store_weights_into(&mut buf);
        buf
    }

    /// Mean absolute value over every weight in the net; a monitoring figure only.
    pub fn mean_absolute_weight(&self) -> f64 {
        let sum: f64 = self.layer_iter().map(NetLayer::sum_absolute_weight).sum();
        let count: usize = self.layer_iter().map(NetLayer::weight_count).sum();
        sum / count as f64
    }

    pub fn get_config(&self) -> NetConfig {
        let layers: Vec<NetLayerConfig> = self.layer_iter()
            .map(NetLayer::get_config)
            .collect();
        NetConfig {
            input_size: self.input_size,
            layers
        }
    }

}

#[cfg(test)]
mod test {
    use super::*;
    use crate::initializer::WeightInitMethod;

    fn initializer(seed: u64) -> WeightInitializer {
        WeightInitializer::new(WeightInitMethod::Linear, 1.0, seed)
    }

    #[test]
    fn test_weight_buffer() {

        let config = NetConfig::new_recurrent(4, [3], ActivationFn::default());

        let mut net = config.create_net(&mut initializer(0));

        let mut buf = net.new_zeroed_weight_buffer();
        let mut buf2 = net.new_zeroed_weight_buffer();

        assert_eq!(buf.num_rows(), 2);
        assert_eq!(buf.get_row(0).len(), 4 * 3 + 3 * 3 + 3);
        assert_eq!(buf.get_row(1).len(), 3 * 1 + 1);

        for (i, element) in buf.get_buffer_mut().iter_mut().enumerate() {
            *element = i as f64;
        }

        net.load_weights_from(&buf);
        net.store_weights_into(&mut buf2);

        for (i, element) in buf2.get_buffer().iter().enumerate() {
            assert_eq!(i as f64, *element);
        }

    }

    #[test]
    fn test_layer_shapes() {
        let net = NetConfig::new_recurrent(144, [20, 20, 20], ActivationFn::default())
            .create_net(&mut initializer(0));
        assert_eq!(net.num_layers(), 4);
        assert_eq!(net.input_size(), 144);
        assert_eq!(net.output_size(), 1);
        for i in 1..net.num_layers() {
            assert_eq!(net.layer(i - 1).output_size(), net.layer(i).input_size());
        }
        assert!(net.layer(2).is_recurrent());
        assert!(!net.layer(net.num_layers() - 1).is_recurrent());
    }

    #[test]
    fn test_same_seed_same_weights() {
        let config = NetConfig::new_recurrent(5, [4, 3], ActivationFn::default());
        let a = config.create_net(&mut WeightInitializer::new(WeightInitMethod::Gaussian, 0.5, 11)).get_weights();
        let b = config.create_net(&mut WeightInitializer::new(WeightInitMethod::Gaussian, 0.5, 11)).get_weights();
        let c = config.create_net(&mut WeightInitializer::new(WeightInitMethod::Gaussian, 0.5, 12)).get_weights();
        let bits = |buf: &RowBuffer| buf.get_buffer().iter().map(|w| w.to_bits()).collect::<Vec<u64>>();
        assert_eq!(bits(&a), bits(&b));
        assert_ne!(bits(&a), bits(&c));
    }

    #[test]
    fn test_mean_absolute_weight() {
        let config = NetConfig::new_recurrent(2, [1], ActivationFn::default());
        let mut net = config.create_net(&mut initializer(0));
        let mut buf = net.new_zeroed_weight_buffer();
        // recurrent: 2 input + 1 internal + 1 bias, output: 1 input + 1 bias
        buf.get_buffer_mut().copy_from_slice(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        net.load_weights_from(&buf);
        assert_eq!(net.mean_absolute_weight(), 12.0 / 6.0);
    }

    #[test]
    fn test_config_round_trip() {
        let config = NetConfig::new_recurrent(4, [5, 4, 3], ActivationFn::Tanh);
        let net = config.create_net(&mut initializer(1));
        assert_eq!(net.get_config(), config);
    }

}
