//! # clitree: command-tree CLI framework
//!
//! Build a tree of named commands, give each one a typed flag schema, a
//! positional-argument validator and up to three run hooks, then hand the
//! process arguments to [`CommandTree::execute`].
//!
//! ## Flow
//!
//! 1. Leading tokens that name a subcommand (or one of its aliases) are
//!    consumed until no child matches.
//! 2. The rest is parsed against the resolved command's [`FlagSchema`] into
//!    typed values and positional arguments.
//! 3. The positional arguments go through the command's [`ArgsValidator`].
//! 4. PreRun, Run and PostRun execute in order; the first failure stops the
//!    sequence and is returned tagged with its [`Phase`].
//!
//! ## Quick Start
//!
//! ```
//! use clitree::args::exact_args;
//! use clitree::flags::{validators, FlagDefinition, FlagSchema};
//! use clitree::{Command, CommandTree};
//!
//! let serve = Command::new("serve")
//!     .about("Start the server")
//!     .alias("s")
//!     .flags(
//!         FlagSchema::builder()
//!             .flag(
//!                 "port",
//!                 FlagDefinition::int()
//!                     .short('p')
//!                     .default_value(8080)
//!                     .validator(validators::range(1024, 65535)),
//!             )
//!             .build()
//!             .unwrap(),
//!     )
//!     .args(exact_args(1))
//!     .run(|cmd, args| {
//!         let port = cmd.flags().get_int("port")?;
//!         println!("serving {} on {}", args[0], port);
//!         Ok(())
//!     });
//!
//! let tree = CommandTree::new(Command::new("app").subcommand(serve)).unwrap();
//! tree.execute(["app", "s", "-p", "9000", "./public"]).unwrap();
//!
//! let err = tree.execute(["app", "serve", "--port", "100", "./public"]).unwrap_err();
//! assert_eq!(err.exit_code(), 2);
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for resolution and lifecycle
//! phases, `trace` per flag token). With the default `subscriber` feature,
//! [`tracing_support::init_subscriber`] installs a stderr subscriber driven by
//! `RUST_LOG`.

use thiserror::Error;

pub mod args;
pub mod command;
pub mod config;
pub mod context;
pub mod flags;
pub mod help;
pub mod lifecycle;
pub mod tracing_support;
pub mod tree;

pub use args::{ArgsError, ArgsValidator};
pub use command::{Command, CommandContext, Hook};
pub use config::{ConfigError, ConfigProvider};
pub use context::Context;
pub use flags::{FlagDefinition, FlagSchema, FlagSet, FlagType, FlagValue, ParseError};
pub use lifecycle::{Lifecycle, LifecycleState, Phase};
pub use tree::{CommandId, CommandInfo, CommandTree, TreeError};

#[cfg(feature = "subscriber")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};

/// Result of executing a command tree.
pub type CliResult<T> = Result<T, Error>;

// ============================================================================
// Error Types
// ============================================================================

/// Everything [`CommandTree::execute`] can fail with.
///
/// Usage errors (bad flags, bad arguments) are distinguished from failures
/// raised by the command's own hooks.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Args(#[from] ArgsError),

    /// A hook returned an error; `phase` says which one.
    #[error("{phase} failed: {source}")]
    Lifecycle {
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Process exit code: 2 for usage errors, 1 for hook failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parse(_) | Error::Args(_) => 2,
            Error::Lifecycle { .. } => 1,
        }
    }

    pub fn is_usage_error(&self) -> bool {
        self.exit_code() == 2
    }

    /// The phase that failed, for lifecycle errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Lifecycle { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
