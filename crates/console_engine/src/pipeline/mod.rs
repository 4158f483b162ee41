//! Parse/populate/completion seams and their schema-driven reference implementation.

mod completion;
mod parser;
mod populator;

pub use completion::SchemaCompletionParser;
pub use parser::SchemaLineParser;
pub use populator::SchemaPopulator;

use console_contract::{CommandSchema, CompleteOperation, ParseError, ParsedLine, PopulateError};

use crate::command::Command;
use crate::providers::InvocationProviders;

/// Structured line parser owned by a command container.
pub trait CommandLineParser {
    /// Schema this parser was built from.
    fn schema(&self) -> &CommandSchema;

    /// Parses one full submitted line into its structured representation.
    fn parse(&self, line: &str) -> Result<ParsedLine, ParseError>;

    /// The populator binding parsed lines onto command instances.
    fn populator(&self) -> &dyn CommandPopulator;

    /// The completion-side parser for this command.
    fn completion_parser(&self) -> &dyn CompletionParser;

    /// Rendered usage text for the command.
    fn help_text(&self) -> String;
}

/// Binds a parsed line onto a command instance through the provider registries.
pub trait CommandPopulator {
    /// Converts, checks, and hands typed values to the command.
    ///
    /// With `validate` enabled, required options and arguments are enforced (unless the line
    /// carries an override-required option) and named option validators run.
    fn populate(
        &self,
        command: &mut dyn Command,
        parsed: &ParsedLine,
        providers: &InvocationProviders,
        validate: bool,
    ) -> Result<(), PopulateError>;
}

/// What the cursor is positioned over within a buffer under completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionTarget {
    /// An option name; `partial` holds the text typed after the leading dashes.
    OptionName {
        /// Typed prefix of the option name.
        partial: String,
    },
    /// The value of a named option.
    OptionValue {
        /// Long name of the option whose value is being completed.
        option: String,
        /// Typed prefix of the value.
        partial: String,
    },
    /// The positional argument at `index`.
    Argument {
        /// Zero-based positional index.
        index: usize,
        /// Typed prefix of the argument.
        partial: String,
    },
}

/// Completion-side parser owned by a command container.
pub trait CompletionParser {
    /// Resolves the completion target at `cursor` within `buffer`.
    fn locate_target(&self, buffer: &str, cursor: usize) -> Result<CompletionTarget, ParseError>;

    /// Injects already-typed values into `command`, then appends candidates for `target`.
    fn populate_candidates(
        &self,
        target: &CompletionTarget,
        command: &mut dyn Command,
        operation: &mut CompleteOperation,
        providers: &InvocationProviders,
    ) -> anyhow::Result<()>;
}
