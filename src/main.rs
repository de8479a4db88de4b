use std::{
    env,
    error::Error,
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use log::info;
use tracing_subscriber::EnvFilter;

use onset_rnn::{
    config::NetworkConfiguration,
    data::Dataset,
    metrics::{CsvMetricsSink, MetricsError, MetricsSink},
    train::{Executor, SinkFactory},
};

const USAGE: &str = "usage: onset-train --dataset <frames.csv> [--configs <configs.csv>] \
                     [--logs <dir>] [--workers <n>] [--epochs <n>]";

struct Args {
    dataset: PathBuf,
    configs: Option<PathBuf>,
    logs: PathBuf,
    workers: Option<usize>,
    epochs: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = parse_args(env::args().skip(1))?;

    let dataset = Arc::new(Dataset::from_csv(&args.dataset)?);
    info!(
        "loaded {} training, {} validation and {} testing samples with {} features",
        dataset.training_samples().len(),
        dataset.validation_samples().len(),
        dataset.testing_samples().len(),
        dataset.feature_width(),
    );

    let mut configurations = match args.configs {
        Some(ref path) => NetworkConfiguration::read_csv(path)?,
        None => vec![NetworkConfiguration::default()],
    };
    if let Some(epochs) = args.epochs {
        for config in configurations.iter_mut() {
            config.epochs = epochs;
        }
    }

    let executor = match args.workers {
        Some(workers) => Executor::Local(workers),
        None => Executor::default(),
    };
    let logs = args.logs;
    let sink_factory: Arc<SinkFactory> = Arc::new(move |config: &NetworkConfiguration| -> Result<Box<dyn MetricsSink>, MetricsError> {
        let sink = CsvMetricsSink::create_in_dir(&logs, config)?;
        Ok(Box::new(sink) as Box<dyn MetricsSink>)
    });

    let total = configurations.len();
    let results = executor.run_batch(configurations, dataset, sink_factory)?;
    for result in results.iter() {
        match result.last {
            Some(ref last) => info!(
                "{}: validation f = {:.4}, test f = {:.4}",
                result.name, last.validation_f_score, last.test_f_score,
            ),
            None => info!("{}: no epochs run", result.name),
        }
    }
    info!("{} of {} configurations completed", results.len(), total);

    Ok(())

}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, Box<dyn Error>> {
    let mut dataset = None;
    let mut configs = None;
    let mut logs = PathBuf::from("logs");
    let mut workers = None;
    let mut epochs = None;

    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{} needs a value\n{}", flag, USAGE));
        match flag.as_str() {
            "--dataset" => dataset = Some(PathBuf::from(value()?)),
            "--configs" => configs = Some(PathBuf::from(value()?)),
            "--logs" => logs = PathBuf::from(value()?),
            "--workers" => workers = Some(parse_arg::<usize>(&flag, &value()?)?),
            "--epochs" => epochs = Some(parse_arg::<usize>(&flag, &value()?)?),
            _ => return Err(format!("unknown argument {}\n{}", flag, USAGE).into()),
        }
    }

    if workers == Some(0) || epochs == Some(0) {
        return Err(format!("--workers and --epochs must be positive\n{}", USAGE).into());
    }
    Ok(Args {
        dataset: dataset.ok_or_else(|| USAGE.to_string())?,
        configs,
        logs,
        workers,
        epochs,
    })
}

fn parse_arg<T: FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("invalid value for {}: {}", flag, value))
}
