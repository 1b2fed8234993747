// smoothflow_sim/src/error.rs

use smoothflow_core::prelude::EstimationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to load scenario: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid scenario value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("scenario directory {0:?} contains no .toml files")]
    EmptyCatalog(PathBuf),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error("failed to render scenario: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ScenarioError {
    fn from(e: figment::Error) -> Self {
        ScenarioError::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
