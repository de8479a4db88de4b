use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{error, info};

use crate::{
    config::NetworkConfiguration,
    data::Dataset,
    metrics::{MetricsError, MetricsSink},
    train::{EvaluationError, EvaluationResult, NetworkEvaluator},
    utils::first_duplicate,
};

quick_error! {
    #[derive(Debug)]
    pub enum ExecutorError {
        Evaluation(err: EvaluationError) {
            from()
            description("Evaluation failed")
            display("Evaluation failed: {}", err)
        }
        Metrics(err: MetricsError) {
            from()
            description("Could not create metrics sink")
            display("Could not create metrics sink: {}", err)
        }
        DuplicateName(name: String) {
            description("Configuration name used more than once")
            display("Configuration name {} is used more than once", name)
        }
        WorkerPanicked(executor_id: String) {
            description("Worker thread panicked")
            display("Worker thread {} panicked", executor_id)
        }
    }
}

/// Creates the metrics sink for each configuration a worker picks up.
pub type SinkFactory = dyn Fn(&NetworkConfiguration) -> Result<Box<dyn MetricsSink>, MetricsError> + Send + Sync;

pub enum ExecutorEvent {
    TaskAccepted {
        task_id: String,
        executor_id: String,
    },
    TaskResult(EvaluationResult),
    TaskError {
        task_id: String,
        executor_id: String,
        error: ExecutorError,
    },
}

/// Runs a batch of configurations, each on its own evaluator and network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Executor {
    Local(usize),
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Local(num_cpus::get())
    }
}

impl Executor {

    pub fn start(&self, dataset: Arc<Dataset>, sink_factory: Arc<SinkFactory>) -> ExecutorControlMaster {
        match *self {
            Executor::Local(num_workers) => start_local(num_workers.max(1), dataset, sink_factory),
        }
    }

    /// Evaluates every configuration and returns the runs that completed. Failed runs are logged
    /// and skipped. Names must be unique.
    pub fn run_batch(
        &self,
        configurations: Vec<NetworkConfiguration>,
        dataset: Arc<Dataset>,
        sink_factory: Arc<SinkFactory>,
    ) -> Result<Vec<EvaluationResult>, ExecutorError> {
        if let Some(dupe) = first_duplicate(configurations.iter().map(|config| &config.name)) {
            return Err(ExecutorError::DuplicateName(dupe.clone()));
        }
        let master = self.start(dataset, sink_factory);
        let total = configurations.len();
        for config in configurations {
            master.send_task(config);
        }
        let events = master.finish();

        let mut results = Vec::with_capacity(total);
        for event in events.iter() {
            match event {
                ExecutorEvent::TaskAccepted { task_id, executor_id } => {
                    info!("{} accepted {}", executor_id, task_id);
                },
                ExecutorEvent::TaskResult(result) => {
                    info!("{} finished {} epochs in {:?}", result.name, result.epochs, result.elapsed);
                    results.push(result);
                },
                ExecutorEvent::TaskError { task_id, executor_id, error } => {
                    error!("{} failed on {}: {}", task_id, executor_id, error);
                },
            }
        }
        events.join()?;
        Ok(results)
    }

}

fn start_local(num_workers: usize, dataset: Arc<Dataset>, sink_factory: Arc<SinkFactory>) -> ExecutorControlMaster {
    // mpmc queue of configurations, drained by the workers
    let (task_sender, task_receiver) = crossbeam::channel::unbounded::<NetworkConfiguration>();
    let (event_sender, event_receiver) = mpsc::channel();

    let workers = (0..num_workers)
        .map(|worker_idx| {
            let executor_id = format!("local_executor_{}", worker_idx);
            let slave = ExecutorControlSlave {
                executor_id: executor_id.clone(),
                task_receiver: task_receiver.clone(),
                event_sender: event_sender.clone(),
            };
            let evaluator = NetworkEvaluator::new(dataset.clone());
            let sink_factory = sink_factory.clone();
            let handle = thread::spawn(move || slave.run(&evaluator, &*sink_factory));
            (executor_id, handle)
        })
        .collect();

    ExecutorControlMaster {
        task_sender,
        events: ExecutorEvents { event_receiver, workers },
    }
}

pub struct ExecutorControlMaster {
    task_sender: crossbeam::channel::Sender<NetworkConfiguration>,
    events: ExecutorEvents,
}

impl ExecutorControlMaster {

    pub fn send_task(&self, config: NetworkConfiguration) {
        // workers only hang up after the sender is dropped
        let _ = self.task_sender.send(config);
    }

    /// Closes the queue; workers exit once it is drained.
    pub fn finish(self) -> ExecutorEvents {
        drop(self.task_sender);
        self.events
    }

}

pub struct ExecutorEvents {
    event_receiver: Receiver<ExecutorEvent>,
    workers: Vec<(String, JoinHandle<()>)>,
}

impl ExecutorEvents {

    /// Blocks until every worker has exited.
    pub fn iter(&self) -> mpsc::Iter<ExecutorEvent> {
        self.event_receiver.iter()
    }

    pub fn join(self) -> Result<(), ExecutorError> {
        for (executor_id, handle) in self.workers {
            if handle.join().is_err() {
                return Err(ExecutorError::WorkerPanicked(executor_id));
            }
        }
        Ok(())
    }

}

struct ExecutorControlSlave {
    executor_id: String,
    task_receiver: crossbeam::channel::Receiver<NetworkConfiguration>,
    event_sender: Sender<ExecutorEvent>,
}

impl ExecutorControlSlave {

    fn run(self, evaluator: &NetworkEvaluator, sink_factory: &SinkFactory) {
        while let Ok(config) = self.task_receiver.recv() {
            let task_id = config.name.clone();
            if !self.send(ExecutorEvent::TaskAccepted {
                task_id: task_id.clone(),
                executor_id: self.executor_id.clone(),
            }) {
                return;
            }
            let event = match evaluate(evaluator, sink_factory, &config) {
                Ok(result) => ExecutorEvent::TaskResult(result),
                Err(error) => ExecutorEvent::TaskError {
                    task_id,
                    executor_id: self.executor_id.clone(),
                    error,
                },
            };
            if !self.send(event) {
                return;
            }
        }
    }

    fn send(&self, event: ExecutorEvent) -> bool {
        self.event_sender.send(event).is_ok()
    }

}

fn evaluate(
    evaluator: &NetworkEvaluator,
    sink_factory: &SinkFactory,
    config: &NetworkConfiguration,
) -> Result<EvaluationResult, ExecutorError> {
    let mut sink = sink_factory(config)?;
    Ok(evaluator.evaluate(config, &mut *sink)?)
}
