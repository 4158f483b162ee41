//! Scoped command container released exactly once per dispatch or completion call.

use std::cell::Cell;
use std::rc::Rc;

use crate::command::Command;
use crate::pipeline::CommandLineParser;

/// Bundles one command instance and its parser for the duration of a single call.
///
/// The container is exclusively owned by the call that looked it up. Its release hook runs
/// exactly once — through an explicit [`release`](Self::release) or on drop, whichever comes
/// first — regardless of which pipeline stage failed.
pub struct CommandContainer {
    command: Box<dyn Command>,
    parser: Box<dyn CommandLineParser>,
    released: Cell<bool>,
    release_hook: Option<Rc<dyn Fn()>>,
}

impl CommandContainer {
    /// Creates a container without a release hook.
    pub fn new(command: Box<dyn Command>, parser: Box<dyn CommandLineParser>) -> Self {
        Self {
            command,
            parser,
            released: Cell::new(false),
            release_hook: None,
        }
    }

    /// Creates a container whose hook observes the release.
    pub fn with_release_hook(
        command: Box<dyn Command>,
        parser: Box<dyn CommandLineParser>,
        hook: Rc<dyn Fn()>,
    ) -> Self {
        Self {
            command,
            parser,
            released: Cell::new(false),
            release_hook: Some(hook),
        }
    }

    /// The owned command instance.
    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    /// Mutable access to the owned command instance.
    pub fn command_mut(&mut self) -> &mut dyn Command {
        self.command.as_mut()
    }

    /// The owned parser.
    pub fn parser(&self) -> &dyn CommandLineParser {
        self.parser.as_ref()
    }

    /// Split borrow so populate can mutate the command while the parser is in use.
    pub fn command_and_parser(&mut self) -> (&mut dyn Command, &dyn CommandLineParser) {
        (self.command.as_mut(), self.parser.as_ref())
    }

    /// Releases the container; subsequent calls (and the drop) are no-ops.
    pub fn release(&self) {
        if !self.released.replace(true) {
            if let Some(hook) = &self.release_hook {
                hook();
            }
        }
    }
}

impl Drop for CommandContainer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use console_contract::{BoundCommandLine, CommandSchema, ParseError, ResultCode};

    use super::*;
    use crate::command::CommandInvocation;
    use crate::pipeline::SchemaLineParser;

    struct NoopCommand;

    impl Command for NoopCommand {
        fn populate(&mut self, _line: &BoundCommandLine) -> Result<(), ParseError> {
            Ok(())
        }

        fn execute(
            &mut self,
            _invocation: Box<dyn CommandInvocation>,
        ) -> anyhow::Result<ResultCode> {
            Ok(ResultCode::Success)
        }
    }

    fn container(releases: Rc<std::cell::Cell<usize>>) -> CommandContainer {
        let schema = Rc::new(CommandSchema::new("noop", "Does nothing."));
        CommandContainer::with_release_hook(
            Box::new(NoopCommand),
            Box::new(SchemaLineParser::new(schema)),
            Rc::new(move || releases.set(releases.get() + 1)),
        )
    }

    #[test]
    fn drop_runs_release_hook_once() {
        let releases = Rc::new(std::cell::Cell::new(0));
        drop(container(Rc::clone(&releases)));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn explicit_release_suppresses_drop_release() {
        let releases = Rc::new(std::cell::Cell::new(0));
        let held = container(Rc::clone(&releases));
        held.release();
        held.release();
        drop(held);
        assert_eq!(releases.get(), 1);
    }
}
