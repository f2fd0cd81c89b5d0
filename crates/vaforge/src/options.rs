//! Module-wide configuration, loadable from a `vaforge.toml` file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to read options file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the header comment of an emitted module is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStamp {
    /// Local date and time, captured once when the module is created.
    #[default]
    Now,
    /// A fixed string, for reproducible output.
    Fixed(String),
}

impl HeaderStamp {
    pub(crate) fn resolve(&self) -> String {
        match self {
            HeaderStamp::Now => chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            HeaderStamp::Fixed(text) => text.clone(),
        }
    }
}

/// Electrical defaults used by the high-level devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDefaults {
    /// Initial rise time of transition-driven outputs, in seconds.
    pub rise_time: f64,
    /// Initial fall time of transition-driven outputs, in seconds.
    pub fall_time: f64,
    /// Output resistance of digital drivers, in ohms.
    pub series_resistance: f64,
    /// Input capacitance of digital receivers, in farads.
    pub input_capacitance: f64,
    /// Gain inside the `tanh` regulator of the SMU.
    pub smu_gain: f64,
    /// Capacitive regulariser on every SMU pin, in farads.
    pub smu_capacitance: f64,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            rise_time: 1e-9,
            fall_time: 1e-9,
            series_resistance: 100.0,
            input_capacitance: 10e-15,
            smu_gain: 50.0,
            smu_capacitance: 1e-12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOptions {
    /// Lines are soft-wrapped after a `),` once they reach this column.
    pub wrap_column: usize,
    /// Time tolerance passed to the sequencer timer drivers.
    pub timer_tolerance: Option<f64>,
    pub header: HeaderStamp,
    pub devices: DeviceDefaults,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            wrap_column: 80,
            timer_tolerance: None,
            header: HeaderStamp::default(),
            devices: DeviceDefaults::default(),
        }
    }
}

impl ModuleOptions {
    /// Options with a fixed header stamp, so that emitted text is reproducible.
    pub fn reproducible(stamp: impl Into<String>) -> Self {
        Self {
            header: HeaderStamp::Fixed(stamp.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
