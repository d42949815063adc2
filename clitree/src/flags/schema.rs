//! Declarative flag schema.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::types::{FlagType, FlagValue};
use super::validators::FlagValidator;

/// Errors raised while assembling a [`FlagSchema`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("flag name must not be empty")]
    EmptyName,

    #[error("flag --{0} is declared more than once")]
    DuplicateName(String),

    #[error("short alias -{short} of --{name} is already used by --{existing}")]
    DuplicateShort {
        short: char,
        name: String,
        existing: String,
    },

    #[error("default for --{name} is a {actual}, but the flag is declared as {expected}")]
    DefaultTypeMismatch {
        name: String,
        expected: FlagType,
        actual: FlagType,
    },
}

/// Description of a single flag.
///
/// Built with one of the typed constructors and refined with chained setters:
///
/// ```
/// use clitree::flags::{validators, FlagDefinition};
///
/// let port = FlagDefinition::int()
///     .short('p')
///     .description("Port to listen on")
///     .default_value(8080)
///     .validator(validators::range(1024, 65535));
/// assert_eq!(port.short_alias(), Some('p'));
/// ```
pub struct FlagDefinition {
    flag_type: FlagType,
    short: Option<char>,
    description: String,
    default: Option<FlagValue>,
    required: bool,
    validator: Option<Box<dyn FlagValidator>>,
    deprecated: Option<String>,
    hidden: bool,
    persistent: bool,
    annotations: BTreeMap<String, String>,
}

impl FlagDefinition {
    /// Create a definition of the given type
    pub fn new(flag_type: FlagType) -> Self {
        Self {
            flag_type,
            short: None,
            description: String::new(),
            default: None,
            required: false,
            validator: None,
            deprecated: None,
            hidden: false,
            persistent: false,
            annotations: BTreeMap::new(),
        }
    }

    /// String flag
    pub fn string() -> Self {
        Self::new(FlagType::String)
    }

    /// Int flag
    pub fn int() -> Self {
        Self::new(FlagType::Int)
    }

    /// Int64 flag
    pub fn int64() -> Self {
        Self::new(FlagType::Int64)
    }

    /// Float64 flag
    pub fn float64() -> Self {
        Self::new(FlagType::Float64)
    }

    /// Bool flag; `--name` alone means true
    pub fn bool() -> Self {
        Self::new(FlagType::Bool)
    }

    /// Duration flag (`30s`, `1h30m`)
    pub fn duration() -> Self {
        Self::new(FlagType::Duration)
    }

    /// Comma-separated string list flag
    pub fn string_list() -> Self {
        Self::new(FlagType::StringList)
    }

    /// Comma-separated int list flag
    pub fn int_list() -> Self {
        Self::new(FlagType::IntList)
    }

    /// Set short option
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Set help text
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Value returned by lookups when the flag was not supplied.
    ///
    /// Integer literals convert to `FlagValue::Int`; pass `FlagValue::Int64(..)`
    /// for int64 flags. The type is checked when the flag is added to a schema.
    pub fn default_value(mut self, value: impl Into<FlagValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a validator run on every supplied value
    pub fn validator(mut self, validator: impl FlagValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Mark the flag deprecated; supplying it still works but logs a warning.
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Hide the flag from help output. Parsing is unaffected.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Advertise the flag to descendant commands' help.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Attach free-form metadata
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Declared type
    pub fn flag_type(&self) -> FlagType {
        self.flag_type
    }

    /// Short option, if any
    pub fn short_alias(&self) -> Option<char> {
        self.short
    }

    /// Help text
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// Default value, if any
    pub fn default(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// Whether the flag must be supplied
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Attached validator, if any
    pub fn validator_fn(&self) -> Option<&dyn FlagValidator> {
        self.validator.as_deref()
    }

    /// Deprecation message, if deprecated
    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// Whether help skips the flag
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether descendants list the flag as global
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Attached metadata
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }
}

impl fmt::Debug for FlagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagDefinition")
            .field("flag_type", &self.flag_type)
            .field("short", &self.short)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("has_validator", &self.validator.is_some())
            .field("deprecated", &self.deprecated)
            .field("hidden", &self.hidden)
            .field("persistent", &self.persistent)
            .finish()
    }
}

/// Ordered set of flag definitions for one command.
///
/// Declaration order is preserved; required-flag checks and metadata
/// snapshots walk flags in that order.
#[derive(Debug, Default)]
pub struct FlagSchema {
    flags: Vec<(String, FlagDefinition)>,
}

impl FlagSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a schema builder
    pub fn builder() -> FlagSchemaBuilder {
        FlagSchemaBuilder::default()
    }

    /// Add a flag, rejecting duplicate names, duplicate short aliases and
    /// defaults whose type disagrees with the declared type.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        definition: FlagDefinition,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if self.get(&name).is_some() {
            return Err(SchemaError::DuplicateName(name));
        }
        if let Some(short) = definition.short {
            if let Some((existing, _)) = self.flags.iter().find(|(_, d)| d.short == Some(short)) {
                return Err(SchemaError::DuplicateShort {
                    short,
                    name,
                    existing: existing.clone(),
                });
            }
        }
        if let Some(default) = &definition.default {
            if default.flag_type() != definition.flag_type {
                return Err(SchemaError::DefaultTypeMismatch {
                    name,
                    expected: definition.flag_type,
                    actual: default.flag_type(),
                });
            }
        }
        self.flags.push((name, definition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Resolve a name as typed on the command line.
    ///
    /// Long names are tried first, then single-character short aliases.
    /// Returns the canonical (long) name with the definition.
    pub fn resolve(&self, name: &str) -> Option<(&str, &FlagDefinition)> {
        if let Some((n, d)) = self.flags.iter().find(|(n, _)| n == name) {
            return Some((n.as_str(), d));
        }
        let mut chars = name.chars();
        let short = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return None,
        };
        self.flags
            .iter()
            .find(|(_, d)| d.short == Some(short))
            .map(|(n, d)| (n.as_str(), d))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagDefinition)> {
        self.flags.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Flags marked persistent, in declaration order.
    pub fn persistent(&self) -> impl Iterator<Item = (&str, &FlagDefinition)> {
        self.iter().filter(|(_, d)| d.persistent)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Chained construction of a [`FlagSchema`]; the first error is reported by `build`.
#[derive(Default)]
pub struct FlagSchemaBuilder {
    pending: Vec<(String, FlagDefinition)>,
}

impl FlagSchemaBuilder {
    /// Add a flag
    pub fn flag(mut self, name: impl Into<String>, definition: FlagDefinition) -> Self {
        self.pending.push((name.into(), definition));
        self
    }

    pub fn build(self) -> Result<FlagSchema, SchemaError> {
        let mut schema = FlagSchema::new();
        for (name, definition) in self.pending {
            schema.insert(name, definition)?;
        }
        Ok(schema)
    }
}
