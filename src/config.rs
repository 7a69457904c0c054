//! Solver configuration, loaded from JSON.
use crate::discretisation::DiscretisationKind;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Only piecewise linear elements are supported by the sparse discretisation.
    UnsupportedDegree(u32),
    UnknownDiscretisation(String),
    UnknownProblem(String),
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDegree(deg) => {
                write!(f, "polynomial degree {} is not supported by the sparse discretisation", deg)
            }
            Self::UnknownDiscretisation(name) => write!(f, "unknown discretisation type \"{}\"", name),
            Self::UnknownProblem(name) => write!(f, "unknown problem type \"{}\"", name),
            Self::InvalidValue { key, reason } => write!(f, "invalid value for \"{}\": {}", key, reason),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseHeatConfig {
    /// Polynomial degree of the spatial elements.
    pub deg: u32,
    pub end_time: f64,
    pub min_temporal_level: u32,
    /// Number of levels shared by the temporal and spatial hierarchies.
    pub num_levels: u32,
    /// Number of uniform refinements of the coarse mesh producing the coarsest spatial level.
    pub min_spatial_level: u32,
    pub discretisation_type: String,
    pub problem_type: String,
    pub cg_tolerance: f64,
    pub cg_max_iterations: usize,
}

impl Default for SparseHeatConfig {
    fn default() -> Self {
        Self {
            deg: 1,
            end_time: 1.0,
            min_temporal_level: 1,
            num_levels: 1,
            min_spatial_level: 1,
            discretisation_type: "H1Hdiv".to_string(),
            problem_type: "unitSquare_test2".to_string(),
            cg_tolerance: 1e-10,
            cg_max_iterations: 10_000,
        }
    }
}

impl SparseHeatConfig {
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| eyre::eyre!("failed to read config file {}: {}", path.display(), err))?;
        Self::from_json_str(&json)
    }

    /// Rejects configurations which would produce a wrong or meaningless system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deg != 1 {
            return Err(ConfigError::UnsupportedDegree(self.deg));
        }
        self.discretisation_kind()?;
        crate::problem::problem_from_name(&self.problem_type)?;
        if !(self.end_time > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "end_time",
                reason: "must be positive".to_string(),
            });
        }
        if self.num_levels == 0 {
            return Err(ConfigError::InvalidValue {
                key: "num_levels",
                reason: "at least one level is required".to_string(),
            });
        }
        if !(self.cg_tolerance > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "cg_tolerance",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn discretisation_kind(&self) -> Result<DiscretisationKind, ConfigError> {
        self.discretisation_type.parse()
    }

    /// Highest temporal refinement level, reached by the last level of the hierarchy.
    pub fn max_temporal_level(&self) -> u32 {
        self.min_temporal_level + self.num_levels - 1
    }
}
