//! Flag schema, parsing and validation.
//!
//! - [`FlagSchema`] / [`FlagDefinition`]: what a command accepts
//! - [`FlagSet`]: the outcome of parsing one argument vector against a schema
//! - [`validators`]: reusable per-value predicates
//!
//! ```
//! use clitree::flags::{validators, FlagDefinition, FlagSchema, FlagSet};
//!
//! let schema = FlagSchema::builder()
//!     .flag(
//!         "port",
//!         FlagDefinition::int()
//!             .short('p')
//!             .default_value(8080)
//!             .validator(validators::range(1024, 65535)),
//!     )
//!     .flag("debug", FlagDefinition::bool())
//!     .build()
//!     .unwrap();
//!
//! let flags = FlagSet::parse(&schema, &["--debug", "-p", "9000", "input.txt"]).unwrap();
//! assert_eq!(flags.get_int("port").unwrap(), 9000);
//! assert!(flags.get_bool("debug").unwrap());
//! assert_eq!(flags.args(), ["input.txt"]);
//! ```

pub mod duration;
mod flagset;
mod schema;
mod types;
pub mod validators;

pub use duration::{format_duration, parse_duration, DurationError};
pub use flagset::{coerce, FlagError, FlagSet, ParseError, ValueError};
pub use schema::{FlagDefinition, FlagSchema, FlagSchemaBuilder, SchemaError};
pub use types::{FlagType, FlagValue};
pub use validators::{FlagValidator, ValidationError};
