//! Driver configuration module.
//!
//! This module provides configuration loading for the comparison driver
//! from environment variables.
//!
//! # Environment Variables
//!
//! - `MULTIWAY_DEGREE`: Minimum degree `t` of both trees (default: `3`)
//! - `MULTIWAY_SEED`: Seed for the random key generator (default: OS entropy)
//! - `MULTIWAY_BENCH_SIZE`: Number of keys used by `bench` (default: `1000`)
//!
//! # Invariants
//!
//! - `degree` is always a valid minimum degree (`t >= 2`)
//! - `bench_size` is always at least 1

use crate::tree::Degree;

/// Driver configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`:
/// - `degree` holds a validated minimum degree
/// - `bench_size` is non-zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Minimum degree both trees are built with.
    pub degree: Degree,
    /// Seed for reproducible random keys. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Number of keys inserted and searched by the benchmark command.
    pub bench_size: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            degree: Self::DEFAULT_DEGREE,
            seed: None,
            bench_size: Self::DEFAULT_BENCH_SIZE,
        }
    }
}

impl DriverConfig {
    /// Default minimum degree.
    pub const DEFAULT_DEGREE: Degree = match Degree::new(3) {
        Ok(degree) => degree,
        Err(_) => panic!("3 is a valid degree"),
    };
    /// Default number of benchmark keys.
    pub const DEFAULT_BENCH_SIZE: usize = 1000;

    const DEGREE_VAR: &'static str = "MULTIWAY_DEGREE";
    const SEED_VAR: &'static str = "MULTIWAY_SEED";
    const BENCH_SIZE_VAR: &'static str = "MULTIWAY_BENCH_SIZE";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set but cannot be parsed, if
    /// `MULTIWAY_DEGREE` is below 2, or if `MULTIWAY_BENCH_SIZE` is 0.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`DriverConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let degree = Self::load_degree(lookup(Self::DEGREE_VAR))?;
        let seed = Self::load_seed(lookup(Self::SEED_VAR))?;
        let bench_size = Self::load_bench_size(lookup(Self::BENCH_SIZE_VAR))?;

        Ok(Self {
            degree,
            seed,
            bench_size,
        })
    }

    /// Parse the minimum degree.
    ///
    /// Returns the default if not set.
    fn load_degree(value: Option<String>) -> Result<Degree, ConfigError> {
        let Some(value) = value else {
            return Ok(Self::DEFAULT_DEGREE);
        };

        let t = value.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
            name: Self::DEGREE_VAR.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        })?;

        Degree::new(t).map_err(|e| ConfigError::InvalidValue {
            name: Self::DEGREE_VAR.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse the random seed.
    ///
    /// Returns `None` if not set.
    fn load_seed(value: Option<String>) -> Result<Option<u64>, ConfigError> {
        value
            .map(|value| {
                value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    name: Self::SEED_VAR.to_string(),
                    message: format!("'{value}' is not a valid u64 seed"),
                })
            })
            .transpose()
    }

    /// Parse the benchmark size.
    ///
    /// Returns the default if not set.
    fn load_bench_size(value: Option<String>) -> Result<usize, ConfigError> {
        match value {
            Some(value) => match value.parse::<usize>() {
                Ok(0) | Err(_) => Err(ConfigError::InvalidValue {
                    name: Self::BENCH_SIZE_VAR.to_string(),
                    message: format!("'{value}' is not a positive integer"),
                }),
                Ok(size) => Ok(size),
            },
            None => Ok(Self::DEFAULT_BENCH_SIZE),
        }
    }
}
