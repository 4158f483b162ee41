//! Minimal interactive console wired onto the dispatch engine.
//!
//! Reads lines from stdin, dispatches them, and exits with the last command's status once
//! the session stops (via the `exit` command or end of input).

use std::io::{self, BufRead};
use std::rc::Rc;

use console_contract::{
    ArgSpec, BoundCommandLine, CommandSchema, ConsoleOperation, OptionSpec, ParseError,
    ResultCode, ValidationError, Value, ValueKind,
};
use console_engine::{
    Command, CommandInvocation, CommandRegistry, ConsoleEngine, InternalCommandRegistry,
    MutableCommandRegistry, Shell, StdoutShell,
};
use tracing_subscriber::EnvFilter;

/// Greets a named person, optionally repeated.
#[derive(Default)]
struct GreetCommand {
    name: String,
    count: i64,
    loud: bool,
}

impl GreetCommand {
    fn schema() -> CommandSchema {
        CommandSchema::new("greet", "Greet someone by name.")
            .option(
                OptionSpec::value("name", ValueKind::String, "Who to greet.").short('n'),
            )
            .option(
                OptionSpec::value("count", ValueKind::Integer, "How many times.")
                    .short('c')
                    .default_value("1"),
            )
            .option(OptionSpec::flag("loud", "Shout the greeting.").short('l'))
    }
}

impl Command for GreetCommand {
    fn populate(&mut self, line: &BoundCommandLine) -> Result<(), ParseError> {
        self.name = line.option_str("name").unwrap_or_default().to_string();
        self.count = line.option("count").and_then(Value::as_int).unwrap_or(1);
        self.loud = line.flag("loud");
        Ok(())
    }

    fn has_validator(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("greet: --name must not be empty"));
        }
        if self.count < 1 {
            return Err(ValidationError::new("greet: --count must be positive"));
        }
        Ok(())
    }

    fn execute(&mut self, invocation: Box<dyn CommandInvocation>) -> anyhow::Result<ResultCode> {
        let greeting = if self.loud {
            format!("HELLO {}!", self.name.to_uppercase())
        } else {
            format!("Hello {}", self.name)
        };
        for _ in 0..self.count {
            invocation.shell().println(&greeting);
        }
        Ok(ResultCode::Success)
    }
}

/// Echoes its arguments back.
#[derive(Default)]
struct EchoCommand {
    words: Vec<String>,
}

impl EchoCommand {
    fn schema() -> CommandSchema {
        CommandSchema::new("echo", "Print the given words.")
            .arg(ArgSpec::new("words", "Words to print.").repeatable())
    }
}

impl Command for EchoCommand {
    fn populate(&mut self, line: &BoundCommandLine) -> Result<(), ParseError> {
        self.words = line
            .arguments()
            .iter()
            .map(|value| value.to_string())
            .collect();
        Ok(())
    }

    fn execute(&mut self, invocation: Box<dyn CommandInvocation>) -> anyhow::Result<ResultCode> {
        invocation.shell().println(&self.words.join(" "));
        Ok(ResultCode::Success)
    }
}

/// Stops the console session.
struct ExitCommand;

impl ExitCommand {
    fn schema() -> CommandSchema {
        CommandSchema::new("exit", "Leave the console.")
    }
}

impl Command for ExitCommand {
    fn populate(&mut self, _line: &BoundCommandLine) -> Result<(), ParseError> {
        Ok(())
    }

    fn execute(&mut self, invocation: Box<dyn CommandInvocation>) -> anyhow::Result<ResultCode> {
        invocation.stop_console();
        Ok(ResultCode::Success)
    }
}

/// Lists registered command names; lives in the internal fallback tier.
struct HelpCommand {
    registry: MutableCommandRegistry,
}

impl HelpCommand {
    fn schema() -> CommandSchema {
        CommandSchema::new("help", "List available commands.")
    }
}

impl Command for HelpCommand {
    fn populate(&mut self, _line: &BoundCommandLine) -> Result<(), ParseError> {
        Ok(())
    }

    fn execute(&mut self, invocation: Box<dyn CommandInvocation>) -> anyhow::Result<ResultCode> {
        let shell = invocation.shell();
        for name in self.registry.command_names() {
            shell.println(&name);
        }
        shell.println("help");
        Ok(ResultCode::Success)
    }
}

fn build_engine(shell: Rc<dyn Shell>) -> ConsoleEngine {
    let registry = MutableCommandRegistry::new();
    registry.add_command(GreetCommand::schema(), || Box::<GreetCommand>::default());
    registry.add_command(EchoCommand::schema(), || Box::<EchoCommand>::default());
    registry.add_command(ExitCommand::schema(), || Box::new(ExitCommand));

    let mut internal = InternalCommandRegistry::new();
    let help_registry = registry.clone();
    internal.add_command(HelpCommand::schema(), move || {
        Box::new(HelpCommand {
            registry: help_registry.clone(),
        })
    });

    let mut engine = ConsoleEngine::new(Rc::new(registry), shell);
    engine.set_internal_registry(internal);
    engine
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let shell: Rc<dyn Shell> = Rc::new(StdoutShell);
    let engine = build_engine(Rc::clone(&shell));
    let stdin = io::stdin();
    let mut exit_code = 0;

    while engine.is_running() {
        shell.print("> ");
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                exit_code = engine.dispatch(None);
            }
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                exit_code = engine.dispatch(Some(ConsoleOperation::new(line)));
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to read input");
                break;
            }
        }
    }

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use console_engine::{MemoryShell, LINE_SEPARATOR};

    use super::*;

    fn engine_with_capture() -> (ConsoleEngine, Rc<MemoryShell>) {
        let shell = Rc::new(MemoryShell::new());
        let engine = build_engine(Rc::clone(&shell) as Rc<dyn Shell>);
        (engine, shell)
    }

    #[test]
    fn greet_with_name_succeeds() {
        let (engine, shell) = engine_with_capture();
        assert_eq!(engine.execute("greet --name=Bob"), 0);
        assert_eq!(shell.output(), format!("Hello Bob{LINE_SEPARATOR}"));
    }

    #[test]
    fn greet_without_name_fails_validation() {
        let (engine, shell) = engine_with_capture();
        assert_eq!(engine.execute("greet"), 1);
        assert!(shell.output().contains("--name must not be empty"));
    }

    #[test]
    fn echo_joins_repeatable_arguments() {
        let (engine, shell) = engine_with_capture();
        assert_eq!(engine.execute("echo one two three"), 0);
        assert_eq!(shell.output(), format!("one two three{LINE_SEPARATOR}"));
    }

    #[test]
    fn exit_stops_the_session() {
        let (engine, _shell) = engine_with_capture();
        assert_eq!(engine.execute("exit"), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn help_resolves_through_the_internal_tier() {
        let (engine, shell) = engine_with_capture();
        assert_eq!(engine.execute("help"), 0);
        assert!(shell.output().contains("greet"));
        assert!(shell.output().contains("echo"));
    }
}
