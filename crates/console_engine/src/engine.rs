//! The console engine: command dispatch and completion over the registry chain.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use console_contract::{
    CommandNotFoundError, CompleteOperation, ConsoleOperation, ParseError, PopulateError,
    ResultCode, ValidationError,
};
use thiserror::Error;

use crate::command::{
    CommandNotFoundHandler, ConsoleInvocation, ConsoleProcess, Shell, LINE_SEPARATOR,
};
use crate::container::CommandContainer;
use crate::providers::{
    CommandInvocationProvider, DefaultInvocationProvider, InvocationProviders, ProviderRegistry,
    DEFAULT_PROVIDER_NAME,
};
use crate::registry::{CommandRegistry, InternalCommandRegistry, RegistryChain};

/// Classified dispatch failure; every kind is recovered at the dispatch boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed line or failed value binding.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// No registry tier resolved the command name.
    #[error(transparent)]
    NotFound(#[from] CommandNotFoundError),
    /// Business-rule rejection.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Anything else, including execution-time failures.
    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}

impl From<PopulateError> for DispatchError {
    fn from(error: PopulateError) -> Self {
        match error {
            PopulateError::Binding(parse) => DispatchError::Parse(parse),
            PopulateError::Validation(validation) => DispatchError::Validation(validation),
        }
    }
}

/// Drives submitted lines and completion requests through the registry chain.
///
/// The engine is single-threaded and handles one request at a time, matching interactive
/// REPL semantics. Registries and providers are expected to be populated during setup,
/// before the interactive loop begins.
pub struct ConsoleEngine {
    chain: RegistryChain,
    invocation_providers: InvocationProviders,
    invocation_services: ProviderRegistry<dyn CommandInvocationProvider>,
    selected_invocation_provider: RefCell<String>,
    not_found_handler: Option<Box<dyn CommandNotFoundHandler>>,
    shell: Rc<dyn Shell>,
    running: Rc<Cell<bool>>,
    attached_process: RefCell<Option<Box<dyn ConsoleProcess>>>,
}

impl ConsoleEngine {
    /// Creates an engine over the primary registry, writing diagnostics through `shell`.
    pub fn new(registry: Rc<dyn CommandRegistry>, shell: Rc<dyn Shell>) -> Self {
        Self {
            chain: RegistryChain::new(vec![registry]),
            invocation_providers: InvocationProviders::new(),
            invocation_services: ProviderRegistry::new(Rc::new(DefaultInvocationProvider)),
            selected_invocation_provider: RefCell::new(DEFAULT_PROVIDER_NAME.to_string()),
            not_found_handler: None,
            shell,
            running: Rc::new(Cell::new(true)),
            attached_process: RefCell::new(None),
        }
    }

    /// Installs the fallback tier consulted after the primary registry.
    pub fn set_internal_registry(&mut self, registry: InternalCommandRegistry) {
        self.chain.push_tier(Rc::new(registry));
    }

    /// Installs the recovery hook for unresolved command names.
    pub fn set_not_found_handler(&mut self, handler: Box<dyn CommandNotFoundHandler>) {
        self.not_found_handler = Some(handler);
    }

    /// Registers a named invocation-enhancement strategy.
    pub fn register_invocation_provider(
        &mut self,
        name: impl Into<String>,
        provider: Rc<dyn CommandInvocationProvider>,
    ) {
        self.invocation_services.register(name, provider);
    }

    /// Selects the invocation provider used by subsequent dispatches.
    ///
    /// Unknown names fall back to the default-named provider at enhancement time.
    pub fn set_invocation_provider(&self, name: impl Into<String>) {
        *self.selected_invocation_provider.borrow_mut() = name.into();
    }

    /// Conversion/completion/validation provider bundle.
    pub fn invocation_providers(&self) -> &InvocationProviders {
        &self.invocation_providers
    }

    /// Mutable provider bundle for setup-time registration.
    pub fn invocation_providers_mut(&mut self) -> &mut InvocationProviders {
        &mut self.invocation_providers
    }

    /// Shell the engine reports through.
    pub fn shell(&self) -> Rc<dyn Shell> {
        Rc::clone(&self.shell)
    }

    /// Whether the console session is still running.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Stops the console session; the surrounding read loop observes this via
    /// [`is_running`](Self::is_running).
    pub fn stop(&self) {
        self.running.set(false);
    }

    /// Attaches a long-running foreground process, replacing any previous one.
    pub fn attach_process(&self, process: Box<dyn ConsoleProcess>) {
        *self.attached_process.borrow_mut() = Some(process);
    }

    /// Detaches the attached process, if any, notifying it.
    pub fn detach_process(&self) {
        if let Some(mut process) = self.attached_process.borrow_mut().take() {
            process.detach();
        }
    }

    /// Whether a long-running process is currently attached.
    pub fn has_attached_process(&self) -> bool {
        self.attached_process.borrow().is_some()
    }

    /// Dispatches one submitted line; `None` signals end of input and stops the session.
    ///
    /// Returns the shell-style exit code: 0 on command success, 1 on every failure.
    pub fn dispatch(&self, operation: Option<ConsoleOperation>) -> i32 {
        let result = match operation {
            None => {
                self.stop();
                ResultCode::Failure
            }
            Some(operation) => {
                if operation.buffer.trim().is_empty() {
                    ResultCode::Failure
                } else {
                    match self.run_operation(&operation) {
                        Ok(result) => result,
                        Err(error) => {
                            self.report(&operation, error);
                            ResultCode::Failure
                        }
                    }
                }
            }
        };
        result.exit_code()
    }

    /// Dispatches `line` programmatically with no control operator.
    pub fn execute(&self, line: &str) -> i32 {
        self.dispatch(Some(ConsoleOperation::new(line)))
    }

    /// Rendered usage text for a registered command; empty when the name is unknown.
    pub fn help_text(&self, command_name: &str) -> String {
        match self.chain.lookup(command_name, "") {
            Ok(container) => container.parser().help_text(),
            Err(_) => String::new(),
        }
    }

    fn run_operation(&self, operation: &ConsoleOperation) -> Result<ResultCode, DispatchError> {
        let name = console_line::first_word(&operation.buffer);
        let mut container = self.chain.lookup(name, &operation.buffer)?;
        let parsed = container.parser().parse(&operation.buffer)?;
        {
            let (command, parser) = container.command_and_parser();
            parser
                .populator()
                .populate(command, &parsed, &self.invocation_providers, true)?;
        }
        {
            let command = container.command();
            if command.has_validator() && !parsed.has_override_required() {
                command.validate()?;
            }
        }
        let invocation = ConsoleInvocation::attached(
            Rc::clone(&self.shell),
            operation.control_operator,
            Rc::clone(&self.running),
        );
        let provider = self
            .invocation_services
            .get_or_default(self.selected_invocation_provider.borrow().as_str());
        Ok(container.command_mut().execute(provider.enhance(invocation))?)
    }

    fn report(&self, operation: &ConsoleOperation, error: DispatchError) {
        match error {
            DispatchError::Parse(error) => self.shell.println(&error.to_string()),
            DispatchError::Validation(error) => self.shell.println(&error.to_string()),
            DispatchError::NotFound(error) => match &self.not_found_handler {
                Some(handler) => handler.handle(&operation.buffer, self.shell.as_ref()),
                None => self.shell.print(&format!(
                    "Command not found: {}{}",
                    error.name, LINE_SEPARATOR
                )),
            },
            DispatchError::Runtime(error) => {
                tracing::error!(buffer = %operation.buffer, error = %error, "exception when parsing/running");
                self.shell.println(&format!(
                    "Exception when parsing/running: {}, {}",
                    operation.buffer, error
                ));
                self.detach_process();
            }
        }
    }

    /// Appends completion candidates for `operation`; never reports a failure outward.
    ///
    /// Name completion takes precedence: when any registered name starts with the buffer,
    /// only names are appended and argument completion is not consulted.
    pub fn complete(&self, operation: &mut CompleteOperation) {
        let matched = self.chain.matching_names(operation.buffer());
        if !matched.is_empty() {
            operation.add_candidates(matched);
            return;
        }

        let name = console_line::first_word(operation.buffer());
        let mut container = match self.chain.lookup(name, operation.buffer()) {
            Ok(container) => container,
            Err(_) => {
                if let Some(handler) = &self.not_found_handler {
                    handler.handle(operation.buffer(), self.shell.as_ref());
                }
                return;
            }
        };
        if let Err(error) =
            complete_arguments(&mut container, operation, &self.invocation_providers)
        {
            match error.downcast_ref::<ParseError>() {
                Some(parse) => tracing::warn!("{parse}"),
                None => {
                    tracing::error!(buffer = %operation.buffer(), error = %error, "runtime error while completing")
                }
            }
        }
    }
}

fn complete_arguments(
    container: &mut CommandContainer,
    operation: &mut CompleteOperation,
    providers: &InvocationProviders,
) -> anyhow::Result<()> {
    let (command, parser) = container.command_and_parser();
    let completion = parser.completion_parser();
    let target = completion.locate_target(operation.buffer(), operation.cursor())?;
    completion.populate_candidates(&target, command, operation, providers)?;
    Ok(())
}
