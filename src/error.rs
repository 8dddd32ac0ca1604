use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A stage of the four-step estimation lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    Initialize,
    CalculateArea,
    CalculateLatency,
    CalculatePower,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Initialize => write!(f, "initialize"),
            Stage::CalculateArea => write!(f, "calculate area"),
            Stage::CalculateLatency => write!(f, "calculate latency"),
            Stage::CalculatePower => write!(f, "calculate power"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("sequence error: cannot {stage} in state `{state}`")]
    Sequence {
        stage: Stage,
        state: crate::blocks::dff::DffState,
    },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with a configuration error unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be positive, got {value}")))
    }
}
