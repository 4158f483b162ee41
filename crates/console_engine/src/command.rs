//! Command-side traits: commands, invocations, shells, and attached processes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use console_contract::{
    BoundCommandLine, ControlOperator, ParseError, ResultCode, ValidationError,
};

/// Platform line terminator appended by [`Shell::println`].
pub const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Text sink the engine and commands write through.
///
/// Implementations own their interior mutability; the engine only ever holds a shared
/// reference.
pub trait Shell {
    /// Writes `text` without a terminator.
    fn print(&self, text: &str);

    /// Writes `text` followed by the platform line terminator.
    fn println(&self, text: &str) {
        self.print(text);
        self.print(LINE_SEPARATOR);
    }
}

/// Shell writing straight to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutShell;

impl Shell for StdoutShell {
    fn print(&self, text: &str) {
        use std::io::Write;
        print!("{text}");
        std::io::stdout().flush().ok();
    }
}

/// Shell capturing output in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryShell {
    output: RefCell<String>,
}

impl MemoryShell {
    /// Creates an empty capture shell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }
}

impl Shell for MemoryShell {
    fn print(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }
}

/// Execution context handed to a command.
pub trait CommandInvocation {
    /// Shell the command writes through.
    fn shell(&self) -> Rc<dyn Shell>;

    /// Control operator the submitted line carried.
    fn control_operator(&self) -> ControlOperator;

    /// Requests the surrounding console session to stop once this dispatch returns.
    fn stop_console(&self);
}

/// Base invocation built by the dispatcher; providers may wrap it.
pub struct ConsoleInvocation {
    shell: Rc<dyn Shell>,
    control_operator: ControlOperator,
    running: Rc<Cell<bool>>,
}

impl ConsoleInvocation {
    /// Creates a standalone invocation not tied to a console session.
    pub fn new(shell: Rc<dyn Shell>, control_operator: ControlOperator) -> Self {
        Self::attached(shell, control_operator, Rc::new(Cell::new(true)))
    }

    pub(crate) fn attached(
        shell: Rc<dyn Shell>,
        control_operator: ControlOperator,
        running: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            shell,
            control_operator,
            running,
        }
    }
}

impl CommandInvocation for ConsoleInvocation {
    fn shell(&self) -> Rc<dyn Shell> {
        Rc::clone(&self.shell)
    }

    fn control_operator(&self) -> ControlOperator {
        self.control_operator
    }

    fn stop_console(&self) {
        self.running.set(false);
    }
}

/// One pluggable console command.
///
/// A fresh instance is built per dispatch or completion call; the typed binder hands it the
/// bound line before validation and execution.
pub trait Command {
    /// Receives the typed values bound from a parsed line.
    fn populate(&mut self, line: &BoundCommandLine) -> Result<(), ParseError>;

    /// Whether this command declares a validator.
    fn has_validator(&self) -> bool {
        false
    }

    /// Business-rule validation of the populated instance.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Runs the command; any error is treated as a runtime fault by the dispatcher.
    fn execute(&mut self, invocation: Box<dyn CommandInvocation>) -> anyhow::Result<ResultCode>;
}

/// Recovery hook for unresolved command names.
pub trait CommandNotFoundHandler {
    /// Called with the full submitted buffer.
    fn handle(&self, buffer: &str, shell: &dyn Shell);
}

/// Long-running process attached to the console session.
pub trait ConsoleProcess {
    /// Called when the engine forcibly detaches the process.
    fn detach(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_shell_captures_println_with_terminator() {
        let shell = MemoryShell::new();
        shell.println("hello");
        assert_eq!(shell.output(), format!("hello{LINE_SEPARATOR}"));
    }

    #[test]
    fn invocation_stop_clears_running_flag() {
        let running = Rc::new(Cell::new(true));
        let invocation = ConsoleInvocation::attached(
            Rc::new(MemoryShell::new()),
            ControlOperator::None,
            Rc::clone(&running),
        );
        invocation.stop_console();
        assert!(!running.get());
    }
}
