//! Embeddable console core: command dispatch and context-aware completion over pluggable
//! commands.
//!
//! The engine drives one submitted line through lookup, parse, populate, validate, and
//! execute, and one buffer/cursor pair through name or argument completion. Every failure
//! class is recovered at the dispatch boundary so the interactive loop never crashes, and
//! the command container resolved for a call is released exactly once on every exit path.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod command;
mod container;
mod engine;
mod pipeline;
mod providers;
mod registry;

pub use command::{
    Command, CommandInvocation, CommandNotFoundHandler, ConsoleInvocation, ConsoleProcess,
    MemoryShell, Shell, StdoutShell, LINE_SEPARATOR,
};
pub use container::CommandContainer;
pub use engine::{ConsoleEngine, DispatchError};
pub use pipeline::{
    CommandLineParser, CommandPopulator, CompletionParser, CompletionTarget,
    SchemaCompletionParser, SchemaLineParser, SchemaPopulator,
};
pub use providers::{
    CommandInvocationProvider, DefaultInvocationProvider, InvocationProviders,
    NoopOptionCompleter, NoopOptionValidator, OptionCompleter, OptionValidator, ProviderRegistry,
    StringValueConverter, ValueConverter, DEFAULT_PROVIDER_NAME,
};
pub use registry::{
    CommandFactory, CommandRegistry, InternalCommandRegistry, MutableCommandRegistry,
    RegistryChain,
};
