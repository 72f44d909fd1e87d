//! Runtime of doclap.
//!
//! A [`Parser`] is assembled from the parameters of a [`Function`] and its
//! numpydoc style documentation:
//!
//! ```text
//! That's a test function
//!
//! Parameters
//! ----------
//! name: str
//!     Just a test
//! verbose: bool
//!     Print more
//! ```
//!
//! Parameters without a default become positional arguments, a `bool`
//! parameter with a boolean default becomes a switch, builtin scalar types
//! select a value parser and `list of X` accepts one or more values. Parsed
//! values end up in a [`Namespace`], which can be handed back to the function
//! with [`Parser::parse2func`].
//!
//! Subparsers added with `add_subparsers(true)` are chained: several of them
//! may follow each other and each one gets its own nested namespace.
mod chain;
pub mod docstring;
pub mod epilog;
mod error;
pub mod interpret;
mod parser;
pub mod registry;
mod settings;
mod signature;
mod value;

pub use chain::namespace_key;
pub use docstring::{DocError, Docstring, ParamDoc};
pub use epilog::EpilogFormatter;
pub use error::{Error, Result};
pub use parser::{Parser, SetupOptions, Subparsers};
pub use registry::{
    Action, ArgOption, ArgOptions, Descriptor, Nargs, OptionKey, Registry, ValueType,
};
pub use settings::ParserSettings;
pub use signature::{Function, Param};
pub use value::{FromValue, Namespace, Value, ValueError};
