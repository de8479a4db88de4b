use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};

use crate::{
    config::NetworkConfiguration,
    data::{Dataset, TrainingSample},
    func::ActivationFn,
    layer::NetError,
    metrics::{EpochMetrics, MetricsError, MetricsSink},
    net::{Net, NetConfig},
    score::OnsetScorer,
    stats::LossStats,
    train::{RecurrentNetTrainer, TrainingOptions},
};

quick_error! {
    #[derive(Debug)]
    pub enum EvaluationError {
        Aborted { name: String, epoch: usize, err: NetError } {
            description("Training run aborted")
            display("Run {} aborted in epoch {}: {}", name, epoch, err)
        }
        Metrics(err: MetricsError) {
            from()
            description("Metrics sink failed")
            display("Metrics sink failed: {}", err)
        }
    }
}

/// Outcome of a run that completed every epoch.
#[derive(Clone, Debug)]
pub struct EvaluationResult {
    pub name: String,
    pub epochs: usize,
    pub last: Option<EpochMetrics>,
    pub net: Net,
    pub elapsed: Duration,
}

/// Trains a fresh network per configuration against a shared, read-only dataset.
#[derive(Clone, Debug)]
pub struct NetworkEvaluator {
    dataset: Arc<Dataset>,
}

struct EpochScorers {
    train: OnsetScorer,
    validation: OnsetScorer,
    test: OnsetScorer,
    loss: LossStats,
}

impl EpochScorers {
    fn new() -> Self {
        EpochScorers {
            train: OnsetScorer::new(),
            validation: OnsetScorer::new(),
            test: OnsetScorer::new(),
            loss: LossStats::new(),
        }
    }

    fn reset(&mut self) {
        self.train.reset();
        self.validation.reset();
        self.test.reset();
        self.loss.reset();
    }
}

impl NetworkEvaluator {

    pub fn new(dataset: Arc<Dataset>) -> Self {
        NetworkEvaluator { dataset }
    }

    /// Builds the network `[feature width, hidden layers.., 1]` described by `config` and trains
    /// it for `config.epochs` epochs, writing one metrics row per epoch to `sink`.
    pub fn evaluate<S>(&self, config: &NetworkConfiguration, sink: &mut S) -> Result<EvaluationResult, EvaluationError>
        where S: MetricsSink + ?Sized
    {
        let start_time = Instant::now();
        sink.write_configuration(config)?;

        let mut initializer = config.create_initializer();
        let net = NetConfig::new_recurrent(self.dataset.feature_width(), &config.hidden_layers, ActivationFn::default())
            .create_net(&mut initializer);
        debug!(
            "{}: created net {:?} with {} initialisation (size {}, seed {})",
            config.name,
            config.hidden_layers,
            config.weight_initialisation_method,
            config.weight_initialisation_size,
            config.seed,
        );

        let mut trainer = RecurrentNetTrainer::new(net, TrainingOptions::from_configuration(config));
        let mut scorers = EpochScorers::new();
        let mut last = None;

        for epoch in 1..=config.epochs {
            if let Err(err) = self.run_epoch(&mut trainer, &mut scorers) {
                let message = err.to_string();
                error!("{}: aborted in epoch {}: {}", config.name, epoch, message);
                if let Err(sink_err) = sink.write_abort(&message) {
                    warn!("{}: could not record abort: {}", config.name, sink_err);
                }
                return Err(EvaluationError::Aborted { name: config.name.clone(), epoch, err });
            }

            let metrics = EpochMetrics::new(
                epoch,
                trainer.net().mean_absolute_weight(),
                &scorers.train,
                &scorers.validation,
                &scorers.test,
            );
            sink.write_epoch(&metrics)?;
            info!(
                "{}: epoch {} loss {:.6} train {} validation {} test {}",
                config.name,
                epoch,
                scorers.loss.mean(),
                scorers.train.to_string(),
                scorers.validation.to_string(),
                scorers.test.to_string(),
            );
            scorers.reset();
            last = Some(metrics);
        }

        Ok(EvaluationResult {
            name: config.name.clone(),
            epochs: config.epochs,
            last,
            net: trainer.into_net(),
            elapsed: start_time.elapsed(),
        })
    }

    fn run_epoch(&self, trainer: &mut RecurrentNetTrainer, scorers: &mut EpochScorers) -> Result<(), NetError> {
        for sample in self.dataset.training_samples() {
            let loss = trainer.train(sample, &mut scorers.train)?;
            scorers.loss.report(loss);
        }
        feed_forward_all(trainer, self.dataset.validation_samples(), &mut scorers.validation)?;
        feed_forward_all(trainer, self.dataset.testing_samples(), &mut scorers.test)
    }

}

fn feed_forward_all(trainer: &RecurrentNetTrainer, samples: &[TrainingSample], scorer: &mut OnsetScorer) -> Result<(), NetError> {
    for sample in samples {
        trainer.feed_forward(sample, scorer)?;
    }
    Ok(())
}
