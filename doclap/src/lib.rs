// Licensed under the MIT license
// (see LICENSE or <http://opensource.org/licenses/MIT>) All files in the project carrying such
//! > doclap builds command-line interfaces with the clap crate out of plain documented functions. The parameter list gives the arguments, the numpydoc style doc comment gives help texts, types and the parser epilog.
//!
//! # How it works
//!
//! 1- Document a function: list its parameters in a `Parameters` section, with their type after a colon.
//!
//! ```text
//! use doclap::command;
//!
//! #[command]
//! /// Add two numbers
//! ///
//! /// Parameters
//! /// ----------
//! /// a: int
//! ///     First operand
//! /// b: int
//! ///     Second operand
//! /// verbose: bool
//! ///     Print the operation
//! fn add(a: i64, #[default(1)] b: i64, #[default(false)] verbose: bool) -> i64 {
//!     if verbose {
//!         println!("{a} + {b}");
//!     }
//!     a + b
//! }
//! ```
//!
//! 2- Set up a parser: the `#[command]` macro generated `AddCommand`, which describes the signature and documentation of `add`.
//!
//! ```text
//! let mut parser = doclap::Parser::new("calc");
//! parser.setup_args::<AddCommand>()?;
//! parser.create_arguments(true)?;
//! ```
//!
//! 3- Parse and call: `parse2func` parses the command line and calls `add` with the parsed values.
//!
//! ```text
//! let sum = parser.parse2func(["2", "-b", "3"])?;
//! ```
//!
//! Parameters without a default are positional, `bool` parameters defaulting to `false` become `--flag` switches, and `int`, `float` or `str` types pick the value parser. The help message then reads:
//!
//! ```text
//! Add two numbers
//!
//! Usage: calc [OPTIONS] <int>
//!
//! Arguments:
//!   <int>  First operand
//!
//! Options:
//!   -b, --b <int>    Second operand
//!       --verbose    Print the operation
//!   -h, --help       Print help
//! ```
//!
//! Subparsers added with `add_subparsers(true)` are chained: `calc add 1 mul 2 3` visits both commands and `parse_chained` returns the result of each of them.
pub use doclap_core::*;
pub use doclap_derive::command;
