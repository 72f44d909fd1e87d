use std::path::PathBuf;

use thiserror::Error;

use crate::docstring::DocError;
use crate::value::ValueError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("argument '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown argument '{0}'")]
    UnknownArgument(String),

    #[error("either a short (-) or a long (--) flag must be provided for '{0}'")]
    MissingFlag(String),

    #[error("flag '{flag}' is used by both '{first}' and '{second}'")]
    Conflict {
        flag: String,
        first: String,
        second: String,
    },

    #[error("invalid configuration for '{name}': {reason}")]
    InvalidArgument { name: String, reason: &'static str },

    #[error("parser '{0}' has already been finalized")]
    AlreadyFinalized(String),

    #[error("parser '{0}' has not been finalized, call create_arguments first")]
    NotFinalized(String),

    #[error("parser '{0}' has no subparsers, call add_subparsers first")]
    NoSubparsers(String),

    #[error("parser '{parser}' has no subparser named '{name}'")]
    UnknownSubparser { parser: String, name: String },

    #[error("subparser '{name}' already exists in parser '{parser}'")]
    DuplicateSubparser { parser: String, name: String },

    #[error("could not figure out to which parser function '{0}' belongs")]
    FunctionNotFound(&'static str),

    #[error("no function has been set up for parser '{0}'")]
    NoFunction(String),

    #[error("no value for '{0}'")]
    MissingValue(String),

    #[error("invalid value for '{name}': {source}")]
    Value {
        name: String,
        #[source]
        source: ValueError,
    },

    #[error("unrecognized arguments: {}", .0.join(" "))]
    UnrecognizedArguments(Vec<String>),

    #[error(transparent)]
    Doc(#[from] DocError),

    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error(transparent)]
    Matches(#[from] clap::parser::MatchesError),

    #[error("unsupported settings file '{0}', only .toml is supported")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),
}
