//! Shared console contracts used by the dispatch engine, line tokenizer, and embedders.
//!
//! This crate is intentionally host-agnostic. It defines serializable operation payloads,
//! command schemas, parsed/bound command lines, typed values, completion payloads, and the
//! error types exchanged across the dispatch pipeline, without depending on any terminal or
//! engine internals.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Control operator attached to a submitted line.
///
/// The dispatch core never interprets the operator; it is carried through to the command
/// invocation so embedders can implement sequencing, piping, or backgrounding around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlOperator {
    /// Plain line with no trailing operator.
    #[default]
    None,
    /// Line ended with a pipe marker.
    Pipe,
    /// Line ended with a background marker.
    Background,
    /// Line ended with a sequencing marker.
    Sequence,
}

/// One submitted line together with its control operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleOperation {
    /// Control operator carried through to the invocation.
    pub control_operator: ControlOperator,
    /// Raw line text as submitted.
    pub buffer: String,
}

impl ConsoleOperation {
    /// Creates an operation with no control operator.
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            control_operator: ControlOperator::None,
            buffer: buffer.into(),
        }
    }

    /// Creates an operation with an explicit control operator.
    pub fn with_operator(control_operator: ControlOperator, buffer: impl Into<String>) -> Self {
        Self {
            control_operator,
            buffer: buffer.into(),
        }
    }
}

/// Two-valued command outcome mapped to a process-style exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultCode {
    /// The command completed successfully.
    Success,
    /// The command failed.
    Failure,
}

impl ResultCode {
    /// Maps the outcome to a shell-style exit integer.
    pub fn exit_code(self) -> i32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::Failure => 1,
        }
    }
}

/// One in-flight completion request: buffer, cursor, and the mutable candidate collection.
///
/// The candidate collection is append-only; the operation itself never deduplicates or
/// reorders what producers append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteOperation {
    buffer: String,
    cursor: usize,
    candidates: Vec<String>,
}

impl CompleteOperation {
    /// Creates a completion request for `buffer` with the cursor at `cursor`.
    pub fn new(buffer: impl Into<String>, cursor: usize) -> Self {
        Self {
            buffer: buffer.into(),
            cursor,
            candidates: Vec::new(),
        }
    }

    /// Buffer text under completion.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor byte offset within the buffer.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Appends one candidate.
    pub fn add_candidate(&mut self, candidate: impl Into<String>) {
        self.candidates.push(candidate.into());
    }

    /// Appends every candidate in order.
    pub fn add_candidates<I>(&mut self, candidates: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for candidate in candidates {
            self.candidates.push(candidate.into());
        }
    }

    /// Candidates collected so far, in append order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }
}

/// Kind of a typed option or argument value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// Free-form text.
    #[default]
    String,
    /// Signed integer.
    Integer,
    /// Boolean flag value (`true`/`false`/`on`/`off`).
    Boolean,
    /// Decimal number.
    Decimal,
}

/// Typed literal produced by value conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Value {
    /// Text value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Decimal value.
    Float(f64),
}

impl Value {
    /// Converts a raw token into a typed value according to `kind`.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self, ParseError> {
        match kind {
            ValueKind::String => Ok(Value::Str(raw.to_string())),
            ValueKind::Integer => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ParseError::new(format!("not an integer: {raw}"))),
            ValueKind::Boolean => match raw {
                "true" | "on" => Ok(Value::Bool(true)),
                "false" | "off" => Ok(Value::Bool(false)),
                other => Err(ParseError::new(format!("not a boolean: {other}"))),
            },
            ValueKind::Decimal => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ParseError::new(format!("not a decimal: {raw}"))),
        }
    }

    /// Text content when this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content when this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean content when this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(text) => write!(f, "{text}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Named option specification within a command schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Long option name without the leading `--`.
    pub name: String,
    /// Optional short option name without the leading `-`.
    pub short: Option<char>,
    /// Short description used in help output.
    pub summary: String,
    /// Value kind for conversion.
    pub kind: ValueKind,
    /// Whether the option must be present on a validated line.
    pub required: bool,
    /// Whether the option consumes a value; `false` makes it a flag.
    pub takes_value: bool,
    /// Raw default applied when the option is absent.
    pub default_value: Option<String>,
    /// When set, presence of this option bypasses required checks and the command validator
    /// for that invocation only.
    pub override_required: bool,
    /// Name of a registered value converter overriding the kind conversion.
    pub converter: Option<String>,
    /// Name of a registered completer for this option's value.
    pub completer: Option<String>,
    /// Name of a registered validator run against the converted value.
    pub validator: Option<String>,
}

impl OptionSpec {
    /// Creates a boolean flag option.
    pub fn flag(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            summary: summary.into(),
            kind: ValueKind::Boolean,
            required: false,
            takes_value: false,
            default_value: None,
            override_required: false,
            converter: None,
            completer: None,
            validator: None,
        }
    }

    /// Creates a value-taking option of the given kind.
    pub fn value(name: impl Into<String>, kind: ValueKind, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            summary: summary.into(),
            kind,
            required: false,
            takes_value: true,
            default_value: None,
            override_required: false,
            converter: None,
            completer: None,
            validator: None,
        }
    }

    /// Sets the short name.
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Marks the option required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the raw default value.
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default_value = Some(raw.into());
        self
    }

    /// Marks the option as bypassing required checks and validation when present.
    pub fn override_required(mut self) -> Self {
        self.override_required = true;
        self
    }

    /// Names a registered converter for this option.
    pub fn converter(mut self, name: impl Into<String>) -> Self {
        self.converter = Some(name.into());
        self
    }

    /// Names a registered completer for this option's value.
    pub fn completer(mut self, name: impl Into<String>) -> Self {
        self.completer = Some(name.into());
        self
    }

    /// Names a registered validator for this option's value.
    pub fn validator(mut self, name: impl Into<String>) -> Self {
        self.validator = Some(name.into());
        self
    }
}

/// Positional argument specification within a command schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Human-readable argument label.
    pub name: String,
    /// Short description used in help output.
    pub summary: String,
    /// Value kind for conversion.
    pub kind: ValueKind,
    /// Whether the argument must be present on a validated line.
    pub required: bool,
    /// Whether this argument consumes all remaining positionals; only valid on the last spec.
    pub repeatable: bool,
    /// Name of a registered completer for this argument.
    pub completer: Option<String>,
}

impl ArgSpec {
    /// Creates an optional string argument.
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            kind: ValueKind::String,
            required: false,
            repeatable: false,
            completer: None,
        }
    }

    /// Sets the value kind.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the argument required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the argument repeatable.
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Names a registered completer for this argument.
    pub fn completer(mut self, name: impl Into<String>) -> Self {
        self.completer = Some(name.into());
        self
    }
}

/// Explicit per-command schema driving parsing, binding, and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    /// Command name matched against the first word of a line.
    pub name: String,
    /// One-line summary used in help output.
    pub summary: String,
    /// Named options in declaration order.
    pub options: Vec<OptionSpec>,
    /// Positional arguments in declaration order.
    pub args: Vec<ArgSpec>,
}

impl CommandSchema {
    /// Creates an empty schema for `name`.
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            options: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Adds an option spec.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds an argument spec.
    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    /// Finds an option spec by long name.
    pub fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.name == name)
    }

    /// Finds an option spec by short name.
    pub fn find_short(&self, short: char) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.short == Some(short))
    }
}

/// One option occurrence on a parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOption {
    /// Resolved long option name.
    pub name: String,
    /// Raw value text; `None` for flags.
    pub raw: Option<String>,
}

/// Structured representation of one parsed command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Command name from the first word.
    pub command: String,
    /// Option occurrences in line order, resolved to long names.
    pub options: Vec<ParsedOption>,
    /// Raw positional argument tokens in line order.
    pub arguments: Vec<String>,
    override_required: bool,
}

impl ParsedLine {
    /// Creates a parsed line.
    pub fn new(
        command: impl Into<String>,
        options: Vec<ParsedOption>,
        arguments: Vec<String>,
        override_required: bool,
    ) -> Self {
        Self {
            command: command.into(),
            options,
            arguments,
            override_required,
        }
    }

    /// True when any option present on the line carries the override-required flag in its
    /// spec, bypassing required checks and the command validator for this invocation.
    pub fn has_override_required(&self) -> bool {
        self.override_required
    }

    /// Finds the first occurrence of the named option.
    pub fn option(&self, name: &str) -> Option<&ParsedOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

/// Typed values bound from a parsed line, handed to a command's populate step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundCommandLine {
    options: BTreeMap<String, Value>,
    arguments: Vec<Value>,
}

impl BoundCommandLine {
    /// Inserts a bound option value.
    pub fn insert_option(&mut self, name: impl Into<String>, value: Value) {
        self.options.insert(name.into(), value);
    }

    /// Appends a bound positional value.
    pub fn push_argument(&mut self, value: Value) {
        self.arguments.push(value);
    }

    /// Bound value for the named option.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// String content of the named option, when bound as text.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }

    /// True when the named flag was set.
    pub fn flag(&self, name: &str) -> bool {
        self.options
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Bound positional value at `index`.
    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    /// All bound positional values in line order.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// Malformed line or failed value binding.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ParseError {
    /// Human-readable failure message.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Business-rule rejection from a command or option validator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable rejection message.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// No registry tier resolved the command name.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("command not found: {name}")]
pub struct CommandNotFoundError {
    /// The unresolved command name.
    pub name: String,
}

impl CommandNotFoundError {
    /// Creates a not-found error for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Failure while populating a command from a parsed line.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PopulateError {
    /// Conversion or binding fault; parse-class.
    #[error(transparent)]
    Binding(#[from] ParseError),
    /// Option-validator rejection; validation-class.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_maps_to_exit_integers() {
        assert_eq!(ResultCode::Success.exit_code(), 0);
        assert_eq!(ResultCode::Failure.exit_code(), 1);
    }

    #[test]
    fn complete_operation_appends_without_dedup() {
        let mut operation = CompleteOperation::new("gr", 2);
        operation.add_candidate("greet");
        operation.add_candidates(vec!["greet".to_string(), "grep".to_string()]);
        assert_eq!(operation.candidates(), ["greet", "greet", "grep"]);
    }

    #[test]
    fn value_parse_honors_kind() {
        assert_eq!(
            Value::parse(ValueKind::Integer, "42").expect("parse"),
            Value::Int(42)
        );
        assert_eq!(
            Value::parse(ValueKind::Boolean, "on").expect("parse"),
            Value::Bool(true)
        );
        assert!(Value::parse(ValueKind::Integer, "forty-two").is_err());
        assert!(Value::parse(ValueKind::Boolean, "maybe").is_err());
    }

    #[test]
    fn schema_lookups_resolve_long_and_short_names() {
        let schema = CommandSchema::new("greet", "Greets someone.")
            .option(OptionSpec::value("name", ValueKind::String, "Who to greet.").short('n'));
        assert!(schema.find_option("name").is_some());
        assert_eq!(
            schema.find_short('n').map(|option| option.name.as_str()),
            Some("name")
        );
        assert!(schema.find_option("missing").is_none());
    }

    #[test]
    fn bound_line_accessors_read_typed_values() {
        let mut bound = BoundCommandLine::default();
        bound.insert_option("name", Value::Str("Bob".to_string()));
        bound.insert_option("loud", Value::Bool(true));
        bound.push_argument(Value::Int(7));
        assert_eq!(bound.option_str("name"), Some("Bob"));
        assert!(bound.flag("loud"));
        assert!(!bound.flag("quiet"));
        assert_eq!(bound.argument(0).and_then(Value::as_int), Some(7));
    }
}
