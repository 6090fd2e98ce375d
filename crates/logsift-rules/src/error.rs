//! Rule configuration errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleConfigError {
    #[error("time window must be a positive number of minutes (rule '{rule}')")]
    InvalidWindow { rule: String },

    #[error("threshold must be a positive count (rule '{rule}')")]
    InvalidThreshold { rule: String },

    #[error("keyword rule needs a non-empty keyword")]
    EmptyKeyword,

    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rules file: {0}")]
    Toml(#[from] toml::de::Error),
}
