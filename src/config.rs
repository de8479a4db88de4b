use std::convert::TryFrom;
use std::path::Path;

use itertools::Itertools;
use serde::Deserialize;

use crate::{
    initializer::{WeightInitMethod, WeightInitializer},
    utils::first_duplicate,
};

quick_error! {
    #[derive(Debug)]
    pub enum ConfigError {
        NotSupported(what: String) {
            description("Configuration value not supported")
            display("{} is not supported", what)
        }
        Invalid(reason: String) {
            description("Invalid configuration")
            display("Invalid configuration: {}", reason)
        }
        Csv(err: csv::Error) {
            from()
            description("CSV error reading configurations")
            display("CSV error reading configurations: {}", err)
        }
    }
}

/// Everything needed to build, initialise and train one network.
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct NetworkConfiguration {
    #[builder(setter(into), default = "String::from(\"default\")")]
    pub name: String,
    #[builder(default = "0.00001")]
    pub learning_coefficient: f64,
    #[builder(default = "0.9")]
    pub momentum: f64,
    #[builder(default = "1.0")]
    pub detection_value: f64,
    #[builder(default = "0.0")]
    pub no_detection_value: f64,
    #[builder(default = "100000")]
    pub epochs: usize,
    #[builder(default = "0")]
    pub seed: u64,
    #[builder(default = "WeightInitMethod::Linear")]
    pub weight_initialisation_method: WeightInitMethod,
    #[builder(default = "1.0")]
    pub weight_initialisation_size: f64,
    /// Sizes of the recurrent layers between the feature input and the single output.
    #[builder(default = "vec![20, 20, 20]")]
    pub hidden_layers: Vec<usize>,
}

impl NetworkConfigurationBuilder {

    fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if let Some(learning_coefficient) = self.learning_coefficient {
            if !(learning_coefficient.is_finite() && learning_coefficient > 0.0) {
                return Err(format!("learning_coefficient must be positive, got {}", learning_coefficient));
            }
        }
        if let Some(momentum) = self.momentum {
            if !(momentum >= 0.0 && momentum < 1.0) {
                return Err(format!("momentum must be in [0, 1), got {}", momentum));
            }
        }
        if self.epochs == Some(0) {
            return Err("epochs must be greater than zero".to_string());
        }
        if let Some(size) = self.weight_initialisation_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(format!("weight_initialisation_size must be positive, got {}", size));
            }
        }
        if let Some(ref hidden_layers) = self.hidden_layers {
            if hidden_layers.is_empty() {
                return Err("at least one hidden layer is required".to_string());
            }
            if hidden_layers.contains(&0) {
                return Err("hidden layer sizes must be non-zero".to_string());
            }
        }
        Ok(())
    }

}

impl Default for NetworkConfiguration {
    fn default() -> Self {
        NetworkConfigurationBuilder::default()
            .build()
            .unwrap_or_else(|err| unreachable!("default configuration rejected: {}", err))
    }
}

impl NetworkConfiguration {

    /// The deterministic random source used for weight initialisation.
    pub fn create_initializer(&self) -> WeightInitializer {
        WeightInitializer::new(
            self.weight_initialisation_method,
            self.weight_initialisation_size,
            self.seed,
        )
    }

    /// Name/value pairs describing this configuration, in a fixed order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("learning_coefficient", self.learning_coefficient.to_string()),
            ("momentum", self.momentum.to_string()),
            ("detection_value", self.detection_value.to_string()),
            ("no_detection_value", self.no_detection_value.to_string()),
            ("epochs", self.epochs.to_string()),
            ("seed", self.seed.to_string()),
            ("weight_initialisation_method", self.weight_initialisation_method.to_string()),
            ("weight_initialisation_size", self.weight_initialisation_size.to_string()),
            ("hidden_layers", self.hidden_layers.iter().join(" ")),
        ]
    }

    /// Reads one configuration per CSV row. Missing cells fall back to the builder defaults.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<NetworkConfiguration>, ConfigError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut configurations = Vec::new();
        for record in reader.deserialize::<ConfigRecord>() {
            configurations.push(NetworkConfiguration::try_from(record?)?);
        }
        if let Some(dupe) = first_duplicate(configurations.iter().map(|config| &config.name)) {
            return Err(ConfigError::Invalid(format!("duplicate configuration name {}", dupe)));
        }
        Ok(configurations)
    }

}

/// Names become metrics file names, so they must be a single plain path component.
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name == "." || name == ".." || name.contains(|c: char| c == '/' || c == '\\' || c.is_control()) {
        return Err(format!("name {:?} is not a valid file name", name));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ConfigRecord {
    name: String,
    learning_coefficient: Option<f64>,
    momentum: Option<f64>,
    detection_value: Option<f64>,
    no_detection_value: Option<f64>,
    epochs: Option<usize>,
    seed: Option<u64>,
    weight_initialisation_method: Option<String>,
    weight_initialisation_size: Option<f64>,
    hidden_layers: Option<String>,
}

impl TryFrom<ConfigRecord> for NetworkConfiguration {
    type Error = ConfigError;

    fn try_from(record: ConfigRecord) -> Result<Self, Self::Error> {
        let mut builder = NetworkConfigurationBuilder::default().name(record.name);
        if let Some(value) = record.learning_coefficient {
            builder = builder.learning_coefficient(value);
        }
        if let Some(value) = record.momentum {
            builder = builder.momentum(value);
        }
        if let Some(value) = record.detection_value {
            builder = builder.detection_value(value);
        }
        if let Some(value) = record.no_detection_value {
            builder = builder.no_detection_value(value);
        }
        if let Some(value) = record.epochs {
            builder = builder.epochs(value);
        }
        if let Some(value) = record.seed {
            builder = builder.seed(value);
        }
        if let Some(value) = record.weight_initialisation_method {
            builder = builder.weight_initialisation_method(value.parse()?);
        }
        if let Some(value) = record.weight_initialisation_size {
            builder = builder.weight_initialisation_size(value);
        }
        if let Some(value) = record.hidden_layers {
            builder = builder.hidden_layers(parse_layer_sizes(&value)?);
        }
        builder.build().map_err(ConfigError::Invalid)
    }
}

fn parse_layer_sizes(value: &str) -> Result<Vec<usize>, ConfigError> {
    value.split_whitespace()
        .map(|size| size.parse::<usize>()
            .map_err(|_| ConfigError::Invalid(format!("bad hidden layer size '{}'", size))))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = NetworkConfiguration::default();
        assert_eq!(config.learning_coefficient, 0.00001);
        assert_eq!(config.momentum, 0.9);
        assert_eq!(config.detection_value, 1.0);
        assert_eq!(config.no_detection_value, 0.0);
        assert_eq!(config.epochs, 100000);
        assert_eq!(config.seed, 0);
        assert_eq!(config.weight_initialisation_method, WeightInitMethod::Linear);
        assert_eq!(config.weight_initialisation_size, 1.0);
        assert_eq!(config.hidden_layers, vec![20, 20, 20]);
    }

    #[test]
    fn test_builder_validation() {
        assert!(NetworkConfigurationBuilder::default().momentum(1.0).build().is_err());
        assert!(NetworkConfigurationBuilder::default().learning_coefficient(0.0).build().is_err());
        assert!(NetworkConfigurationBuilder::default().epochs(0).build().is_err());
        assert!(NetworkConfigurationBuilder::default().hidden_layers(vec![]).build().is_err());
        assert!(NetworkConfigurationBuilder::default().hidden_layers(vec![4, 0]).build().is_err());
        assert!(NetworkConfigurationBuilder::default().weight_initialisation_size(f64::NAN).build().is_err());
        assert!(NetworkConfigurationBuilder::default().momentum(0.0).hidden_layers(vec![4]).build().is_ok());
    }

    #[test]
    fn test_name_must_be_a_file_name() {
        for name in &["", ".", "..", "../escape", "logs/run", "a\\b", "line\nbreak"] {
            assert!(NetworkConfigurationBuilder::default().name(*name).build().is_err(), "accepted {:?}", name);
        }
        for name in &["run-1", "lr_0.001", "..hidden", "a b"] {
            assert!(NetworkConfigurationBuilder::default().name(*name).build().is_ok(), "rejected {:?}", name);
        }
    }

    #[test]
    fn test_read_csv_rejects_bad_names() {
        let duplicate = write_temp("name,epochs\na,1\nb,1\na,2\n");
        match NetworkConfiguration::read_csv(duplicate.path()) {
            Err(ConfigError::Invalid(reason)) => assert!(reason.contains("duplicate configuration name a")),
            other => panic!("unexpected {:?}", other),
        }

        let escaping = write_temp("name,epochs\n../../etc/x,1\n");
        match NetworkConfiguration::read_csv(escaping.path()) {
            Err(ConfigError::Invalid(reason)) => assert!(reason.contains("not a valid file name")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_read_csv() {
        let file = write_temp(
            "name,learning_coefficient,momentum,detection_value,no_detection_value,epochs,seed,weight_initialisation_method,weight_initialisation_size,hidden_layers\n\
             a, 0.001, 0.5, 1.0, 0.0, 10, 3, Gaussian, 0.1, 8 8\n\
             b,,,,,,,,,\n"
        );
        let configs = NetworkConfiguration::read_csv(file.path()).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].name, "a");
        assert_eq!(configs[0].learning_coefficient, 0.001);
        assert_eq!(configs[0].momentum, 0.5);
        assert_eq!(configs[0].epochs, 10);
        assert_eq!(configs[0].seed, 3);
        assert_eq!(configs[0].weight_initialisation_method, WeightInitMethod::Gaussian);
        assert_eq!(configs[0].weight_initialisation_size, 0.1);
        assert_eq!(configs[0].hidden_layers, vec![8, 8]);
        assert_eq!(configs[1], NetworkConfigurationBuilder::default().name("b").build().unwrap());
    }

    #[test]
    fn test_read_csv_unknown_method() {
        let file = write_temp(
            "name,weight_initialisation_method\n\
             a,Orthogonal\n"
        );
        match NetworkConfiguration::read_csv(file.path()) {
            Err(ConfigError::NotSupported(what)) => assert!(what.contains("Orthogonal")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_entries() {
        let config = NetworkConfigurationBuilder::default()
            .name("entries")
            .hidden_layers(vec![3, 2])
            .build()
            .unwrap();
        let entries = config.entries();
        assert_eq!(entries[0], ("name", "entries".to_string()));
        assert_eq!(entries.last().unwrap(), &("hidden_layers", "3 2".to_string()));
    }

}
