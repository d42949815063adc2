//! Positional-argument validators.
//!
//! Validators run once per invocation, after flag parsing and before the
//! lifecycle hooks, against the positional arguments that remain.
//!
//! ```
//! use clitree::args::{exact_args, only_valid_args, ArgsValidator, MatchAll};
//! use clitree::Command;
//!
//! let cmd = Command::new("color").valid_args(["red", "green"]);
//! let validator = MatchAll::new().with(exact_args(1)).with(only_valid_args());
//!
//! assert!(validator.validate(&cmd, &["red".to_string()]).is_ok());
//! assert!(validator.validate(&cmd, &["blue".to_string()]).is_err());
//! ```

use thiserror::Error;

use crate::command::Command;

/// Errors produced by argument validators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    /// Wrong number of positional arguments.
    #[error("invalid number of arguments: expected {expected}, received {received}")]
    InvalidArgs { expected: String, received: usize },

    /// A positional argument outside the command's allowed set.
    #[error("{}", invalid_arg_message(.arg, .valid_args))]
    InvalidArg { arg: String, valid_args: Vec<String> },

    /// Failure reported by a user-supplied validator.
    #[error("{0}")]
    Custom(String),
}

fn invalid_arg_message(arg: &str, valid_args: &[String]) -> String {
    if valid_args.is_empty() {
        format!("invalid argument {:?}", arg)
    } else {
        format!(
            "invalid argument {:?}, valid arguments are: {}",
            arg,
            valid_args.join(", ")
        )
    }
}

impl ArgsError {
    pub fn custom(message: impl Into<String>) -> Self {
        ArgsError::Custom(message.into())
    }
}

/// Predicate over a command's positional arguments.
pub trait ArgsValidator {
    fn validate(&self, cmd: &Command, args: &[String]) -> Result<(), ArgsError>;
}

impl<F> ArgsValidator for F
where
    F: Fn(&Command, &[String]) -> Result<(), ArgsError>,
{
    fn validate(&self, cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        self(cmd, args)
    }
}

// ============================================================================
// Count validators
// ============================================================================

/// Exactly `n` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactArgs(pub usize);

impl ArgsValidator for ExactArgs {
    fn validate(&self, _cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        if args.len() != self.0 {
            return Err(ArgsError::InvalidArgs {
                expected: format!("{} arg(s)", self.0),
                received: args.len(),
            });
        }
        Ok(())
    }
}

/// At least `n` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumNArgs(pub usize);

impl ArgsValidator for MinimumNArgs {
    fn validate(&self, _cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        if args.len() < self.0 {
            return Err(ArgsError::InvalidArgs {
                expected: format!("at least {} arg(s)", self.0),
                received: args.len(),
            });
        }
        Ok(())
    }
}

/// At most `n` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaximumNArgs(pub usize);

impl ArgsValidator for MaximumNArgs {
    fn validate(&self, _cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        if args.len() > self.0 {
            return Err(ArgsError::InvalidArgs {
                expected: format!("at most {} arg(s)", self.0),
                received: args.len(),
            });
        }
        Ok(())
    }
}

/// Between `min` and `max` arguments, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeArgs {
    pub min: usize,
    pub max: usize,
}

impl ArgsValidator for RangeArgs {
    fn validate(&self, _cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        if args.len() < self.min || args.len() > self.max {
            return Err(ArgsError::InvalidArgs {
                expected: format!("between {} and {} arg(s)", self.min, self.max),
                received: args.len(),
            });
        }
        Ok(())
    }
}

/// Shorthand for [`ExactArgs`]
pub fn exact_args(n: usize) -> ExactArgs {
    ExactArgs(n)
}

/// Shorthand for [`MinimumNArgs`]
pub fn minimum_n_args(n: usize) -> MinimumNArgs {
    MinimumNArgs(n)
}

/// Shorthand for [`MaximumNArgs`]
pub fn maximum_n_args(n: usize) -> MaximumNArgs {
    MaximumNArgs(n)
}

/// Shorthand for [`RangeArgs`]
pub fn range_args(min: usize, max: usize) -> RangeArgs {
    RangeArgs { min, max }
}

// ============================================================================
// Content validators
// ============================================================================

/// Every argument must be one of the command's declared valid args.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnlyValidArgs;

impl ArgsValidator for OnlyValidArgs {
    fn validate(&self, cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        let valid_args = cmd.get_valid_args();
        match args.iter().find(|arg| !valid_args.contains(arg)) {
            Some(arg) => Err(ArgsError::InvalidArg {
                arg: arg.clone(),
                valid_args: valid_args.to_vec(),
            }),
            None => Ok(()),
        }
    }
}

/// Shorthand for [`OnlyValidArgs`]
pub fn only_valid_args() -> OnlyValidArgs {
    OnlyValidArgs
}

/// Runs validators in insertion order and stops at the first failure.
#[derive(Default)]
pub struct MatchAll {
    validators: Vec<Box<dyn ArgsValidator>>,
}

impl MatchAll {
    /// Empty composite; accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator
    pub fn with(mut self, validator: impl ArgsValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl ArgsValidator for MatchAll {
    fn validate(&self, cmd: &Command, args: &[String]) -> Result<(), ArgsError> {
        for validator in &self.validators {
            validator.validate(cmd, args)?;
        }
        Ok(())
    }
}

/// Build a [`MatchAll`] from boxed validators
pub fn match_all(validators: Vec<Box<dyn ArgsValidator>>) -> MatchAll {
    MatchAll { validators }
}
