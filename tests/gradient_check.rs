use onset_rnn::{
    data::{TrainingFrame, TrainingSample},
    func::{ActivationFn, ErrorFn},
    initializer::{WeightInitMethod, WeightInitializer},
    net::{Net, NetConfig},
    state::StateSequence,
    train::{RecurrentNetTrainer, TrainingOptions},
};

const EPSILON: f64 = 1e-5;
const TOLERANCE: f64 = 1e-4;

fn options() -> TrainingOptions {
    TrainingOptions {
        learning_coefficient: 0.1,
        momentum: 0.0,
        detection_value: 1.0,
        no_detection_value: 0.0,
        error_fn: ErrorFn::SquaredError,
    }
}

fn sample() -> TrainingSample {
    TrainingSample::new("gradient", vec![
        TrainingFrame::new(0.00, 0.01, vec![0.3, -0.2, 0.9], false),
        TrainingFrame::new(0.01, 0.02, vec![1.0, 0.4, -0.5], true),
        TrainingFrame::new(0.02, 0.03, vec![-0.7, 0.1, 0.2], false),
        TrainingFrame::new(0.03, 0.04, vec![0.5, 0.8, 0.0], true),
        TrainingFrame::new(0.04, 0.05, vec![0.0, -0.6, 0.3], false),
    ])
}

fn loss(net: &Net, sample: &TrainingSample) -> f64 {
    let options = options();
    let mut sequence = StateSequence::new(net);
    let mut loss = 0.0;
    for frame in sample.frames.iter() {
        let output = sequence.push_frame(net, &frame.frame.values).unwrap().output()[0];
        loss += options.error_fn.get_error(options.target(frame.is_onset), output);
    }
    loss
}

fn check_gradients(net: Net) {
    let sample = sample();
    let mut trainer = RecurrentNetTrainer::new(net.clone(), options());
    trainer.accumulate_gradients(&sample).unwrap();
    let analytic = trainer.training_state().get_gradients(&net);

    let weights = net.get_weights();
    let mut probe = net.clone();
    let mut checked = 0;
    for row in 0..weights.num_rows() {
        for index in 0..weights.get_row(row).len() {
            let mut shifted = weights.clone();
            shifted.get_row_mut(row)[index] += EPSILON;
            probe.load_weights_from(&shifted);
            let plus = loss(&probe, &sample);

            shifted.get_row_mut(row)[index] -= 2.0 * EPSILON;
            probe.load_weights_from(&shifted);
            let minus = loss(&probe, &sample);

            let numeric = (plus - minus) / (2.0 * EPSILON);
            let actual = analytic.get_row(row)[index];
            assert!(
                (numeric - actual).abs() <= TOLERANCE * numeric.abs().max(1.0),
                "layer {} weight {}: analytic {} numeric {}", row, index, actual, numeric,
            );
            checked += 1;
        }
    }
    assert_eq!(checked, weights.buffer_len());
}

#[test]
fn test_single_hidden_layer() {
    let mut init = WeightInitializer::new(WeightInitMethod::Linear, 1.0, 17);
    // [3, 2, 1]
    let net = NetConfig::new_recurrent(3, [2], ActivationFn::default()).create_net(&mut init);
    check_gradients(net);
}

#[test]
fn test_stacked_recurrent_layers() {
    let mut init = WeightInitializer::new(WeightInitMethod::Gaussian, 0.5, 4);
    let net = NetConfig::new_recurrent(3, [4, 3], ActivationFn::Tanh).create_net(&mut init);
    check_gradients(net);
}

#[test]
fn test_momentum_carries_previous_gradient() {
    let mut init = WeightInitializer::new(WeightInitMethod::Linear, 1.0, 23);
    let net = NetConfig::new_recurrent(3, [2], ActivationFn::default()).create_net(&mut init);
    let sample = sample();

    let mut plain = RecurrentNetTrainer::new(net.clone(), options());
    plain.accumulate_gradients(&sample).unwrap();
    let single = plain.training_state().get_gradients(&net);

    let mut with_momentum = RecurrentNetTrainer::new(net.clone(), TrainingOptions { momentum: 0.5, ..options() });
    with_momentum.accumulate_gradients(&sample).unwrap();
    with_momentum.accumulate_gradients(&sample).unwrap();
    let carried = with_momentum.training_state().get_gradients(&net);

    for (&g, &c) in single.get_buffer().iter().zip(carried.get_buffer()) {
        assert!((1.5 * g - c).abs() < 1e-12);
    }
}
