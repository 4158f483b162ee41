//! Command registries and the ordered lookup chain.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use console_contract::{CommandNotFoundError, CommandSchema};

use crate::command::Command;
use crate::container::CommandContainer;
use crate::pipeline::SchemaLineParser;

/// Builds one fresh command instance per lookup.
pub type CommandFactory = Rc<dyn Fn() -> Box<dyn Command>>;

/// Keyed lookup from command name to a scoped container.
pub trait CommandRegistry {
    /// Every registered command name, in registry order.
    fn command_names(&self) -> Vec<String>;

    /// Resolves `name` into a container bundling a fresh command and parser.
    ///
    /// `line` is the full submitted buffer, available to registries that specialize the
    /// returned container on it.
    fn get_command(
        &self,
        name: &str,
        line: &str,
    ) -> Result<CommandContainer, CommandNotFoundError>;
}

#[derive(Clone)]
struct Registration {
    schema: Rc<CommandSchema>,
    factory: CommandFactory,
}

impl Registration {
    fn container(&self) -> CommandContainer {
        CommandContainer::new(
            (self.factory)(),
            Box::new(SchemaLineParser::new(Rc::clone(&self.schema))),
        )
    }
}

/// Name-keyed registry for embedder commands.
#[derive(Clone, Default)]
pub struct MutableCommandRegistry {
    entries: Rc<RefCell<BTreeMap<String, Registration>>>,
}

impl MutableCommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command schema with its instance factory, replacing any previous entry.
    pub fn add_command<F>(&self, schema: CommandSchema, factory: F)
    where
        F: Fn() -> Box<dyn Command> + 'static,
    {
        let name = schema.name.clone();
        self.entries.borrow_mut().insert(
            name,
            Registration {
                schema: Rc::new(schema),
                factory: Rc::new(factory),
            },
        );
    }

    /// Removes a registered command.
    pub fn remove_command(&self, name: &str) {
        self.entries.borrow_mut().remove(name);
    }
}

impl CommandRegistry for MutableCommandRegistry {
    fn command_names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn get_command(
        &self,
        name: &str,
        _line: &str,
    ) -> Result<CommandContainer, CommandNotFoundError> {
        self.entries
            .borrow()
            .get(name)
            .map(Registration::container)
            .ok_or_else(|| CommandNotFoundError::new(name))
    }
}

/// Fallback tier for engine-internal commands, consulted only after the primary registry.
#[derive(Default)]
pub struct InternalCommandRegistry {
    entries: BTreeMap<String, Registration>,
}

impl InternalCommandRegistry {
    /// Creates an empty internal registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an internal command schema with its instance factory.
    pub fn add_command<F>(&mut self, schema: CommandSchema, factory: F)
    where
        F: Fn() -> Box<dyn Command> + 'static,
    {
        let name = schema.name.clone();
        self.entries.insert(
            name,
            Registration {
                schema: Rc::new(schema),
                factory: Rc::new(factory),
            },
        );
    }
}

impl CommandRegistry for InternalCommandRegistry {
    fn command_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn get_command(
        &self,
        name: &str,
        _line: &str,
    ) -> Result<CommandContainer, CommandNotFoundError> {
        self.entries
            .get(name)
            .map(Registration::container)
            .ok_or_else(|| CommandNotFoundError::new(name))
    }
}

/// Ordered registry tiers tried in sequence; the first tier that resolves a name wins.
pub struct RegistryChain {
    tiers: Vec<Rc<dyn CommandRegistry>>,
}

impl RegistryChain {
    /// Creates a chain over `tiers` in priority order.
    pub fn new(tiers: Vec<Rc<dyn CommandRegistry>>) -> Self {
        Self { tiers }
    }

    /// Appends a lower-priority tier.
    pub fn push_tier(&mut self, tier: Rc<dyn CommandRegistry>) {
        self.tiers.push(tier);
    }

    /// Resolves `name` through the tiers; the first match is authoritative.
    pub fn lookup(
        &self,
        name: &str,
        line: &str,
    ) -> Result<CommandContainer, CommandNotFoundError> {
        for tier in &self.tiers {
            if let Ok(container) = tier.get_command(name, line) {
                return Ok(container);
            }
        }
        Err(CommandNotFoundError::new(name))
    }

    /// Command names across every tier whose text starts with `prefix`, concatenated in tier
    /// order. Names registered in more than one tier appear once per tier.
    pub fn matching_names(&self, prefix: &str) -> Vec<String> {
        let mut matches = Vec::new();
        for tier in &self.tiers {
            matches.extend(
                tier.command_names()
                    .into_iter()
                    .filter(|name| name.starts_with(prefix)),
            );
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use console_contract::{BoundCommandLine, ParseError, ResultCode};

    use super::*;
    use crate::command::CommandInvocation;

    struct Tagged(&'static str);

    impl Command for Tagged {
        fn populate(&mut self, _line: &BoundCommandLine) -> Result<(), ParseError> {
            Ok(())
        }

        fn execute(
            &mut self,
            invocation: Box<dyn CommandInvocation>,
        ) -> anyhow::Result<ResultCode> {
            invocation.shell().println(self.0);
            Ok(ResultCode::Success)
        }
    }

    fn registry(names: &[&str], tag: &'static str) -> MutableCommandRegistry {
        let registry = MutableCommandRegistry::new();
        for name in names {
            registry.add_command(CommandSchema::new(*name, "test command"), move || {
                Box::new(Tagged(tag))
            });
        }
        registry
    }

    #[test]
    fn first_tier_match_is_authoritative() {
        let chain = RegistryChain::new(vec![
            Rc::new(registry(&["greet"], "primary")),
            Rc::new(registry(&["greet"], "internal")),
        ]);
        let mut container = chain.lookup("greet", "greet").expect("lookup");
        let shell = Rc::new(crate::command::MemoryShell::new());
        container
            .command_mut()
            .execute(Box::new(crate::command::ConsoleInvocation::new(
                Rc::clone(&shell) as Rc<dyn crate::command::Shell>,
                console_contract::ControlOperator::None,
            )))
            .expect("execute");
        assert!(shell.output().contains("primary"));
    }

    #[test]
    fn fallback_tier_resolves_primary_misses() {
        let chain = RegistryChain::new(vec![
            Rc::new(registry(&["greet"], "primary")),
            Rc::new(registry(&["man"], "internal")),
        ]);
        assert!(chain.lookup("man", "man").is_ok());
        assert!(chain.lookup("frobnicate", "frobnicate").is_err());
    }

    #[test]
    fn matching_names_concatenates_tiers_without_dedup() {
        let chain = RegistryChain::new(vec![
            Rc::new(registry(&["greet", "go"], "primary")),
            Rc::new(registry(&["greet"], "internal")),
        ]);
        assert_eq!(chain.matching_names("g"), ["go", "greet", "greet"]);
        assert_eq!(chain.matching_names("gre"), ["greet", "greet"]);
        assert!(chain.matching_names("x").is_empty());
    }

    #[test]
    fn remove_command_unregisters() {
        let registry = registry(&["greet"], "primary");
        registry.remove_command("greet");
        assert!(registry.command_names().is_empty());
    }
}
