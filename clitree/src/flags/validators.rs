//! Per-value validators for flags.
//!
//! A validator runs after a raw token was coerced to the flag's declared type.
//! Built-in validators check one variant of [`FlagValue`] and fail with an
//! "expected X, got Y" message when handed another.

use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use super::duration::format_duration;
use super::types::FlagValue;

/// Message produced by a failing validator.
///
/// The parser prefixes it with the flag name when reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    fn unexpected(expected: &str, value: &FlagValue) -> Self {
        Self(format!("expected {}, got {}", expected, value.flag_type()))
    }
}

/// Predicate over a single coerced flag value.
pub trait FlagValidator {
    fn validate(&self, value: &FlagValue) -> Result<(), ValidationError>;
}

impl<F> FlagValidator for F
where
    F: Fn(&FlagValue) -> Result<(), ValidationError>,
{
    fn validate(&self, value: &FlagValue) -> Result<(), ValidationError> {
        self(value)
    }
}

fn as_integer(value: &FlagValue) -> Result<i64, ValidationError> {
    match value {
        FlagValue::Int(n) | FlagValue::Int64(n) => Ok(*n),
        other => Err(ValidationError::unexpected("int", other)),
    }
}

fn as_str(value: &FlagValue) -> Result<&str, ValidationError> {
    match value {
        FlagValue::String(s) => Ok(s),
        other => Err(ValidationError::unexpected("string", other)),
    }
}

/// Integer within `[min, max]`, inclusive.
pub fn range(min: i64, max: i64) -> impl FlagValidator {
    move |value: &FlagValue| {
        let n = as_integer(value)?;
        if n < min || n > max {
            return Err(ValidationError(format!(
                "must be between {} and {}, got {}",
                min, max, n
            )));
        }
        Ok(())
    }
}

/// Integer strictly greater than zero.
pub fn positive() -> impl FlagValidator {
    |value: &FlagValue| {
        let n = as_integer(value)?;
        if n <= 0 {
            return Err(ValidationError(format!("must be positive, got {}", n)));
        }
        Ok(())
    }
}

/// String with at least one non-whitespace character.
pub fn not_empty() -> impl FlagValidator {
    |value: &FlagValue| {
        if as_str(value)?.trim().is_empty() {
            return Err(ValidationError::new("must not be empty"));
        }
        Ok(())
    }
}

/// String equal to one of `allowed`.
pub fn one_of<I, S>(allowed: I) -> impl FlagValidator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
    move |value: &FlagValue| {
        let s = as_str(value)?;
        if allowed.iter().any(|a| a == s) {
            Ok(())
        } else {
            Err(ValidationError(format!(
                "must be one of: {}",
                allowed.join(", ")
            )))
        }
    }
}

/// String matching a pre-compiled regular expression.
pub fn pattern(re: Regex) -> impl FlagValidator {
    move |value: &FlagValue| {
        if !re.is_match(as_str(value)?) {
            return Err(ValidationError(format!(
                "must match pattern: {}",
                re.as_str()
            )));
        }
        Ok(())
    }
}

/// String of at least `min` characters.
pub fn min_length(min: usize) -> impl FlagValidator {
    move |value: &FlagValue| {
        let len = as_str(value)?.chars().count();
        if len < min {
            return Err(ValidationError(format!(
                "must be at least {} characters, got {}",
                min, len
            )));
        }
        Ok(())
    }
}

/// String of at most `max` characters.
pub fn max_length(max: usize) -> impl FlagValidator {
    move |value: &FlagValue| {
        let len = as_str(value)?.chars().count();
        if len > max {
            return Err(ValidationError(format!(
                "must be at most {} characters, got {}",
                max, len
            )));
        }
        Ok(())
    }
}

pub fn min_duration(min: Duration) -> impl FlagValidator {
    move |value: &FlagValue| match value {
        FlagValue::Duration(d) if *d < min => Err(ValidationError(format!(
            "must be at least {}, got {}",
            format_duration(min),
            format_duration(*d)
        ))),
        FlagValue::Duration(_) => Ok(()),
        other => Err(ValidationError::unexpected("duration", other)),
    }
}

/// List with at least `min` items.
pub fn min_items(min: usize) -> impl FlagValidator {
    move |value: &FlagValue| {
        let len = match value {
            FlagValue::StringList(items) => items.len(),
            FlagValue::IntList(items) => items.len(),
            other => return Err(ValidationError::unexpected("list", other)),
        };
        if len < min {
            return Err(ValidationError(format!(
                "must have at least {} items, got {}",
                min, len
            )));
        }
        Ok(())
    }
}

/// List without repeated items.
pub fn unique_items() -> impl FlagValidator {
    |value: &FlagValue| {
        let items: Vec<String> = match value {
            FlagValue::StringList(items) => items.clone(),
            FlagValue::IntList(items) => items.iter().map(|n| n.to_string()).collect(),
            other => return Err(ValidationError::unexpected("list", other)),
        };
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.clone()) {
                return Err(ValidationError(format!("duplicate item: {}", item)));
            }
        }
        Ok(())
    }
}

/// Runs validators in order, returning the first failure.
pub fn all(validators: Vec<Box<dyn FlagValidator>>) -> impl FlagValidator {
    move |value: &FlagValue| -> Result<(), ValidationError> {
        for validator in &validators {
            validator.validate(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> FlagValue {
        FlagValue::String(v.to_string())
    }

    #[test]
    fn test_range() {
        let v = range(1024, 65535);
        assert!(v.validate(&FlagValue::Int(8080)).is_ok());
        assert!(v.validate(&FlagValue::Int(1024)).is_ok());
        assert!(v.validate(&FlagValue::Int(65535)).is_ok());
        assert!(v.validate(&FlagValue::Int64(9000)).is_ok());

        let err = v.validate(&FlagValue::Int(100)).unwrap_err();
        assert_eq!(err.to_string(), "must be between 1024 and 65535, got 100");

        let err = v.validate(&s("8080")).unwrap_err();
        assert_eq!(err.to_string(), "expected int, got string");
    }

    #[test]
    fn test_positive() {
        let v = positive();
        assert!(v.validate(&FlagValue::Int(1)).is_ok());
        assert!(v.validate(&FlagValue::Int(0)).is_err());
        assert!(v.validate(&FlagValue::Int(-3)).is_err());
    }

    #[test]
    fn test_not_empty() {
        let v = not_empty();
        assert!(v.validate(&s("x")).is_ok());
        assert!(v.validate(&s("   ")).is_err());
        assert!(v.validate(&FlagValue::Bool(true)).is_err());
    }

    #[test]
    fn test_one_of() {
        let v = one_of(["development", "staging", "production"]);
        assert!(v.validate(&s("staging")).is_ok());
        let err = v.validate(&s("qa")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "must be one of: development, staging, production"
        );
    }

    #[test]
    fn test_pattern() {
        let v = pattern(Regex::new(r"^[a-z]+$").unwrap());
        assert!(v.validate(&s("abc")).is_ok());
        assert!(v.validate(&s("ABC")).is_err());
    }

    #[test]
    fn test_lengths() {
        assert!(min_length(3).validate(&s("abc")).is_ok());
        assert!(min_length(3).validate(&s("ab")).is_err());
        assert!(max_length(3).validate(&s("abc")).is_ok());
        assert!(max_length(3).validate(&s("abcd")).is_err());
    }

    #[test]
    fn test_min_duration() {
        let v = min_duration(Duration::from_secs(1));
        assert!(v.validate(&FlagValue::Duration(Duration::from_secs(2))).is_ok());
        let err = v
            .validate(&FlagValue::Duration(Duration::from_millis(500)))
            .unwrap_err();
        assert_eq!(err.to_string(), "must be at least 1s, got 500ms");
    }

    #[test]
    fn test_items() {
        let list = FlagValue::from(vec!["a", "b", "a"]);
        assert!(min_items(2).validate(&list).is_ok());
        assert!(min_items(4).validate(&list).is_err());
        assert_eq!(
            unique_items().validate(&list).unwrap_err().to_string(),
            "duplicate item: a"
        );
        assert!(unique_items().validate(&FlagValue::IntList(vec![1, 2])).is_ok());
    }

    #[test]
    fn test_all_stops_at_first_failure() {
        let validators: Vec<Box<dyn FlagValidator>> =
            vec![Box::new(not_empty()), Box::new(min_length(5))];
        let v = all(validators);
        assert_eq!(v.validate(&s(" ")).unwrap_err().to_string(), "must not be empty");
        assert_eq!(
            v.validate(&s("abc")).unwrap_err().to_string(),
            "must be at least 5 characters, got 3"
        );
        assert!(v.validate(&s("abcdef")).is_ok());
    }
}
