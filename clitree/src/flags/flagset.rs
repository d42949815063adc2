//! Flag tokenizer and parsed flag state.
//!
//! [`FlagSet::parse`] walks an argument vector left to right, separating flag
//! tokens from positional arguments and coercing each flag value to the type
//! declared in the [`FlagSchema`]. Parsing is all-or-nothing: the first error
//! aborts and no partially filled set is returned.

use std::collections::{HashMap, HashSet};
use std::num::{ParseFloatError, ParseIntError};
use std::time::Duration;
use thiserror::Error;

use super::duration::{parse_duration, DurationError};
use super::schema::{FlagDefinition, FlagSchema};
use super::types::{FlagType, FlagValue};
use super::validators::ValidationError;

// ============================================================================
// Errors
// ============================================================================

/// Failure to coerce a raw token to a flag's declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error(transparent)]
    Int(#[from] ParseIntError),

    #[error(transparent)]
    Float(#[from] ParseFloatError),

    #[error("invalid boolean literal \"{0}\"")]
    Bool(String),

    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error("invalid integer in list: {fragment}")]
    ListItem { fragment: String },
}

/// Errors produced while parsing flags
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown flag: {token}")]
    UnknownFlag { token: String },

    /// Multi-character short token without `=value`, e.g. `-abc`.
    #[error("invalid short flag: {token}")]
    InvalidShortFlag { token: String },

    #[error("flag --{flag} requires a value")]
    MissingValue { flag: String },

    #[error("invalid value for flag --{flag}: {source}")]
    InvalidValue {
        flag: String,
        #[source]
        source: ValueError,
    },

    #[error("validation failed for flag --{flag}: {source}")]
    ValidationFailed {
        flag: String,
        #[source]
        source: ValidationError,
    },

    #[error("required flag --{flag} not provided")]
    RequiredFlagMissing { flag: String },
}

impl ParseError {
    /// Canonical name of the flag involved, when the error concerns a known flag.
    pub fn flag(&self) -> Option<&str> {
        match self {
            ParseError::UnknownFlag { .. } | ParseError::InvalidShortFlag { .. } => None,
            ParseError::MissingValue { flag }
            | ParseError::InvalidValue { flag, .. }
            | ParseError::ValidationFailed { flag, .. }
            | ParseError::RequiredFlagMissing { flag } => Some(flag),
        }
    }
}

/// Errors returned by typed accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag {0} not defined")]
    Undefined(String),

    #[error("flag {name} is not a {expected} (declared as {actual})")]
    TypeMismatch {
        name: String,
        expected: FlagType,
        actual: FlagType,
    },
}

// ============================================================================
// Coercion
// ============================================================================

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::Bool(raw.to_string())),
    }
}

/// Coerce a raw token to `flag_type`.
pub fn coerce(flag_type: FlagType, raw: &str) -> Result<FlagValue, ValueError> {
    let value = match flag_type {
        FlagType::String => FlagValue::String(raw.to_string()),
        FlagType::Int => FlagValue::Int(raw.parse()?),
        FlagType::Int64 => FlagValue::Int64(raw.parse()?),
        FlagType::Float64 => FlagValue::Float64(raw.parse()?),
        FlagType::Bool => FlagValue::Bool(parse_bool(raw)?),
        FlagType::Duration => FlagValue::Duration(parse_duration(raw)?),
        FlagType::StringList if raw.is_empty() => FlagValue::StringList(Vec::new()),
        FlagType::StringList => FlagValue::StringList(raw.split(',').map(str::to_string).collect()),
        FlagType::IntList if raw.is_empty() => FlagValue::IntList(Vec::new()),
        FlagType::IntList => {
            let items = raw
                .split(',')
                .map(|part| {
                    part.trim().parse::<i64>().map_err(|_| ValueError::ListItem {
                        fragment: part.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            FlagValue::IntList(items)
        }
    };
    Ok(value)
}

// ============================================================================
// FlagSet
// ============================================================================

/// Parsed flag state for one invocation.
///
/// Holds the coerced values of flags that were supplied, which of them were
/// supplied explicitly, and the positional arguments left over.
#[derive(Debug)]
pub struct FlagSet<'s> {
    schema: &'s FlagSchema,
    values: HashMap<String, FlagValue>,
    changed: HashSet<String>,
    args: Vec<String>,
}

/// One classified flag token, before its value is coerced.
struct FlagToken<'a> {
    name: &'a str,
    inline: Option<&'a str>,
}

fn split_inline(body: &str) -> FlagToken<'_> {
    match body.split_once('=') {
        Some((name, value)) => FlagToken {
            name,
            inline: Some(value),
        },
        None => FlagToken {
            name: body,
            inline: None,
        },
    }
}

fn classify(token: &str) -> Result<FlagToken<'_>, ParseError> {
    if let Some(body) = token.strip_prefix("--") {
        return Ok(split_inline(body));
    }
    // Single dash: one character, or any name followed by `=value`.
    let body = &token[1..];
    if body.chars().count() > 1 && !body.contains('=') {
        return Err(ParseError::InvalidShortFlag {
            token: token.to_string(),
        });
    }
    Ok(split_inline(body))
}

impl<'s> FlagSet<'s> {
    /// A set with nothing parsed; every lookup falls back to defaults.
    pub fn new(schema: &'s FlagSchema) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            changed: HashSet::new(),
            args: Vec::new(),
        }
    }

    /// Treat every token as positional, for commands that declare no flags.
    pub(crate) fn positional<S: AsRef<str>>(schema: &'s FlagSchema, args: &[S]) -> Self {
        let mut set = Self::new(schema);
        set.args = args.iter().map(|a| a.as_ref().to_string()).collect();
        set
    }

    /// Parse `args` against `schema`.
    pub fn parse<S: AsRef<str>>(schema: &'s FlagSchema, args: &[S]) -> Result<Self, ParseError> {
        let mut set = Self::new(schema);
        let mut positional = Vec::new();
        let mut tokens = args.iter().map(<S as AsRef<str>>::as_ref);

        while let Some(token) = tokens.next() {
            if !token.starts_with('-') {
                tracing::trace!(token, "positional argument");
                positional.push(token.to_string());
                continue;
            }

            let FlagToken { name, inline } = classify(token)?;
            let (canonical, definition) =
                schema
                    .resolve(name)
                    .ok_or_else(|| ParseError::UnknownFlag {
                        token: token.to_string(),
                    })?;
            tracing::trace!(token, flag = canonical, "flag token");

            let value = match (definition.flag_type(), inline) {
                (FlagType::Bool, None) => FlagValue::Bool(true),
                (flag_type, Some(raw)) => set.coerce_checked(canonical, definition, flag_type, raw)?,
                (flag_type, None) => {
                    let raw = tokens.next().ok_or_else(|| ParseError::MissingValue {
                        flag: canonical.to_string(),
                    })?;
                    set.coerce_checked(canonical, definition, flag_type, raw)?
                }
            };

            if let Some(message) = definition.deprecation() {
                tracing::warn!("flag --{} is deprecated: {}", canonical, message);
            }

            set.values.insert(canonical.to_string(), value);
            set.changed.insert(canonical.to_string());
        }

        set.check_required()?;
        set.args = positional;
        Ok(set)
    }

    fn coerce_checked(
        &self,
        name: &str,
        definition: &FlagDefinition,
        flag_type: FlagType,
        raw: &str,
    ) -> Result<FlagValue, ParseError> {
        let value = coerce(flag_type, raw).map_err(|source| ParseError::InvalidValue {
            flag: name.to_string(),
            source,
        })?;
        if let Some(validator) = definition.validator_fn() {
            validator
                .validate(&value)
                .map_err(|source| ParseError::ValidationFailed {
                    flag: name.to_string(),
                    source,
                })?;
        }
        Ok(value)
    }

    fn check_required(&self) -> Result<(), ParseError> {
        match self
            .schema
            .iter()
            .find(|(name, def)| def.is_required() && !self.changed.contains(*name))
        {
            Some((name, _)) => Err(ParseError::RequiredFlagMissing {
                flag: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn schema(&self) -> &'s FlagSchema {
        self.schema
    }

    /// Supplied value, else the schema default, else `None`.
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values
            .get(name)
            .or_else(|| self.schema.get(name).and_then(FlagDefinition::default))
    }

    /// Whether the flag was supplied on the command line.
    pub fn changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    /// Positional arguments left after flag parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Look up `name`, check it is declared as `expected` and extract the
    /// value (supplied, default, or the type's zero value).
    fn typed<T>(
        &self,
        name: &str,
        expected: FlagType,
        extract: impl FnOnce(FlagValue) -> Option<T>,
    ) -> Result<T, FlagError> {
        let definition = self
            .schema
            .get(name)
            .ok_or_else(|| FlagError::Undefined(name.to_string()))?;
        if definition.flag_type() != expected {
            return Err(FlagError::TypeMismatch {
                name: name.to_string(),
                expected,
                actual: definition.flag_type(),
            });
        }
        let value = self
            .get(name)
            .cloned()
            .unwrap_or_else(|| expected.zero_value());
        let actual = value.flag_type();
        extract(value).ok_or_else(|| FlagError::TypeMismatch {
            name: name.to_string(),
            expected,
            actual,
        })
    }

    pub fn get_string(&self, name: &str) -> Result<String, FlagError> {
        self.typed(name, FlagType::String, |v| match v {
            FlagValue::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FlagError> {
        self.typed(name, FlagType::Int, |v| match v {
            FlagValue::Int(n) => Some(n),
            _ => None,
        })
    }

    pub fn get_int64(&self, name: &str) -> Result<i64, FlagError> {
        self.typed(name, FlagType::Int64, |v| match v {
            FlagValue::Int64(n) => Some(n),
            _ => None,
        })
    }

    pub fn get_float64(&self, name: &str) -> Result<f64, FlagError> {
        self.typed(name, FlagType::Float64, |v| match v {
            FlagValue::Float64(n) => Some(n),
            _ => None,
        })
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, FlagError> {
        self.typed(name, FlagType::Bool, |v| match v {
            FlagValue::Bool(b) => Some(b),
            _ => None,
        })
    }

    pub fn get_duration(&self, name: &str) -> Result<Duration, FlagError> {
        self.typed(name, FlagType::Duration, |v| match v {
            FlagValue::Duration(d) => Some(d),
            _ => None,
        })
    }

    pub fn get_string_list(&self, name: &str) -> Result<Vec<String>, FlagError> {
        self.typed(name, FlagType::StringList, |v| match v {
            FlagValue::StringList(items) => Some(items),
            _ => None,
        })
    }

    pub fn get_int_list(&self, name: &str) -> Result<Vec<i64>, FlagError> {
        self.typed(name, FlagType::IntList, |v| match v {
            FlagValue::IntList(items) => Some(items),
            _ => None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::validators;

    fn server_schema() -> FlagSchema {
        FlagSchema::builder()
            .flag(
                "port",
                FlagDefinition::int()
                    .short('p')
                    .default_value(8080)
                    .validator(validators::range(1024, 65535)),
            )
            .flag("host", FlagDefinition::string().short('h').default_value("localhost"))
            .flag("debug", FlagDefinition::bool().short('d'))
            .flag("timeout", FlagDefinition::duration().default_value(Duration::from_secs(30)))
            .flag("origins", FlagDefinition::string_list())
            .flag("ids", FlagDefinition::int_list())
            .flag("ratio", FlagDefinition::float64())
            .flag("size", FlagDefinition::int64())
            .build()
            .unwrap()
    }

    #[test]
    fn test_long_short_and_inline_forms() {
        let schema = server_schema();
        for args in [
            vec!["--port", "9000"],
            vec!["--port=9000"],
            vec!["-p", "9000"],
            vec!["-p=9000"],
        ] {
            let set = FlagSet::parse(&schema, args.as_slice()).unwrap();
            assert_eq!(set.get_int("port").unwrap(), 9000, "args: {:?}", args);
            assert!(set.changed("port"));
        }
    }

    #[test]
    fn test_defaults_when_not_supplied() {
        let schema = server_schema();
        let set = FlagSet::parse::<&str>(&schema, &[]).unwrap();
        assert_eq!(set.get_int("port").unwrap(), 8080);
        assert_eq!(set.get_string("host").unwrap(), "localhost");
        assert_eq!(set.get_duration("timeout").unwrap(), Duration::from_secs(30));
        assert!(!set.changed("port"));
        // no default: zero value
        assert!(!set.get_bool("debug").unwrap());
        assert!(set.get_string_list("origins").unwrap().is_empty());
        assert!(set.get("origins").is_none());
    }

    #[test]
    fn test_bool_shorthand_does_not_consume_next_token() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["--debug", "serve"]).unwrap();
        assert!(set.get_bool("debug").unwrap());
        assert_eq!(set.args(), ["serve"]);

        let set = FlagSet::parse(&schema, &["--debug=false"]).unwrap();
        assert!(!set.get_bool("debug").unwrap());
        assert!(set.changed("debug"));

        let err = FlagSet::parse(&schema, &["--debug=maybe"]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
    }

    #[test]
    fn test_interleaved_positionals() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["a", "--port", "2000", "b", "-d", "c"]).unwrap();
        assert_eq!(set.args(), ["a", "b", "c"]);
        assert_eq!(set.get_int("port").unwrap(), 2000);
    }

    #[test]
    fn test_unknown_flag_names_token() {
        let schema = server_schema();
        let err = FlagSet::parse(&schema, &["--bogus"]).unwrap_err();
        assert_eq!(err.to_string(), "unknown flag: --bogus");
        let err = FlagSet::parse(&schema, &["-x=1"]).unwrap_err();
        assert_eq!(err.to_string(), "unknown flag: -x=1");
        let err = FlagSet::parse(&schema, &["--"]).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFlag { .. }));
    }

    #[test]
    fn test_short_bundling_rejected() {
        let schema = server_schema();
        let err = FlagSet::parse(&schema, &["-pd"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidShortFlag {
                token: "-pd".into()
            }
        );
    }

    #[test]
    fn test_missing_value() {
        let schema = server_schema();
        let err = FlagSet::parse(&schema, &["--port"]).unwrap_err();
        assert_eq!(err.to_string(), "flag --port requires a value");
        assert_eq!(err.flag(), Some("port"));
    }

    #[test]
    fn test_value_is_taken_verbatim_even_if_dashed() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["--host", "-weird"]).unwrap();
        assert_eq!(set.get_string("host").unwrap(), "-weird");
    }

    #[test]
    fn test_coercion_failures() {
        let schema = server_schema();
        let err = FlagSet::parse(&schema, &["--port", "abc"]).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for flag --port:"));

        let err = FlagSet::parse(&schema, &["--timeout", "soon"]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidValue {
                source: ValueError::Duration(_),
                ..
            }
        ));

        let err = FlagSet::parse(&schema, &["--ids", "1, 2,x"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for flag --ids: invalid integer in list: x"
        );
    }

    #[test]
    fn test_lists() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["--origins", "a, b,c", "--ids= 1, 2 ,3"]).unwrap();
        assert_eq!(set.get_string_list("origins").unwrap(), vec!["a", " b", "c"]);
        assert_eq!(set.get_int_list("ids").unwrap(), vec![1, 2, 3]);

        let set = FlagSet::parse(&schema, &["--origins="]).unwrap();
        assert!(set.get_string_list("origins").unwrap().is_empty());
        assert!(set.changed("origins"));
    }

    #[test]
    fn test_numeric_types() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["--ratio", "0.25", "--size=-9000000000"]).unwrap();
        assert_eq!(set.get_float64("ratio").unwrap(), 0.25);
        assert_eq!(set.get_int64("size").unwrap(), -9_000_000_000);
    }

    #[test]
    fn test_validator_failure_is_prefixed() {
        let schema = server_schema();
        let err = FlagSet::parse(&schema, &["--port", "100"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed for flag --port: must be between 1024 and 65535, got 100"
        );
    }

    #[test]
    fn test_required_flags_first_in_declaration_order() {
        let schema = FlagSchema::builder()
            .flag("name", FlagDefinition::string().required())
            .flag("token", FlagDefinition::string().required())
            .build()
            .unwrap();

        let err = FlagSet::parse::<&str>(&schema, &[]).unwrap_err();
        assert_eq!(
            err,
            ParseError::RequiredFlagMissing {
                flag: "name".into()
            }
        );

        let err = FlagSet::parse(&schema, &["--name", "x"]).unwrap_err();
        assert_eq!(err.to_string(), "required flag --token not provided");

        let set = FlagSet::parse(&schema, &["--name", "x", "--token=y"]).unwrap();
        assert_eq!(set.get_string("token").unwrap(), "y");
    }

    #[test]
    fn test_accessor_errors() {
        let schema = server_schema();
        let set = FlagSet::parse::<&str>(&schema, &[]).unwrap();
        assert_eq!(
            set.get_int("nope").unwrap_err(),
            FlagError::Undefined("nope".into())
        );
        assert!(matches!(
            set.get_string("port").unwrap_err(),
            FlagError::TypeMismatch {
                expected: FlagType::String,
                actual: FlagType::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_hidden_flag_still_parses() {
        let schema = FlagSchema::builder()
            .flag("trace-id", FlagDefinition::string().short('t').hidden())
            .build()
            .unwrap();
        let set = FlagSet::parse(&schema, &["--trace-id", "abc", "-t=def", "run"]).unwrap();
        assert_eq!(set.get_string("trace-id").unwrap(), "def");
        assert!(set.changed("trace-id"));
        assert_eq!(set.args(), ["run"]);
    }

    #[cfg(feature = "subscriber")]
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    #[cfg(feature = "subscriber")]
    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(feature = "subscriber")]
    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    #[cfg(feature = "subscriber")]
    fn test_deprecated_flag_parses_and_warns() {
        let schema = FlagSchema::builder()
            .flag("bind", FlagDefinition::string().deprecated("use --host instead"))
            .flag("host", FlagDefinition::string())
            .build()
            .unwrap();

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let set = tracing::subscriber::with_default(subscriber, || {
            FlagSet::parse(&schema, &["--bind", "0.0.0.0"])
        })
        .unwrap();

        assert_eq!(set.get_string("bind").unwrap(), "0.0.0.0");
        assert!(set.changed("bind"));
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("flag --bind is deprecated: use --host instead"));

        // not supplied: no warning
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            FlagSet::parse(&schema, &["--host", "example.com"])
        })
        .unwrap();
        assert!(captured.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_later_occurrence_wins() {
        let schema = server_schema();
        let set = FlagSet::parse(&schema, &["--port", "2000", "-p", "3000"]).unwrap();
        assert_eq!(set.get_int("port").unwrap(), 3000);
    }
}
