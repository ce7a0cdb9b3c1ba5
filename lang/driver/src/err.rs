use bounce_dynamics::EvalError;
use bounce_statics::StaticsError;
use bounce_surface::ParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("IO error on `{}`: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("invalid configuration `{}`: {}", .0.display(), .1)]
    Conf(PathBuf, toml::de::Error),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Statics(#[from] StaticsError),
    #[error("{0}")]
    Eval(#[from] EvalError),
}

pub type Result<T> = std::result::Result<T, DriverError>;
