//! Name-keyed capability registries for invocation, conversion, completion, and validation
//! strategies.

use std::collections::BTreeMap;
use std::rc::Rc;

use console_contract::{CompleteOperation, ParseError, ValidationError, Value};

use crate::command::{CommandInvocation, ConsoleInvocation};

/// Name of the designated default entry in every provider registry.
pub const DEFAULT_PROVIDER_NAME: &str = "default";

/// Name-keyed registry with one designated default entry.
///
/// The default is seeded at construction and can be replaced by registering under
/// [`DEFAULT_PROVIDER_NAME`]; lookups for unknown names fall back to it.
pub struct ProviderRegistry<P: ?Sized> {
    default: Rc<P>,
    entries: BTreeMap<String, Rc<P>>,
}

impl<P: ?Sized> ProviderRegistry<P> {
    /// Creates a registry seeded with `default`.
    pub fn new(default: Rc<P>) -> Self {
        Self {
            default,
            entries: BTreeMap::new(),
        }
    }

    /// Registers `provider` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, provider: Rc<P>) {
        self.entries.insert(name.into(), provider);
    }

    /// The provider registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Rc<P>> {
        match self.entries.get(name) {
            Some(provider) => Some(Rc::clone(provider)),
            None if name == DEFAULT_PROVIDER_NAME => Some(self.default_provider()),
            None => None,
        }
    }

    /// The provider registered under `name`, falling back to the default entry.
    pub fn get_or_default(&self, name: &str) -> Rc<P> {
        self.entries
            .get(name)
            .map(Rc::clone)
            .unwrap_or_else(|| self.default_provider())
    }

    /// The current default entry.
    pub fn default_provider(&self) -> Rc<P> {
        self.entries
            .get(DEFAULT_PROVIDER_NAME)
            .map(Rc::clone)
            .unwrap_or_else(|| Rc::clone(&self.default))
    }
}

/// Enhancement strategy applied to the base invocation before execution.
pub trait CommandInvocationProvider {
    /// Wraps or returns the invocation handed to the command.
    fn enhance(&self, invocation: ConsoleInvocation) -> Box<dyn CommandInvocation>;
}

/// Identity enhancement used as the default invocation provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInvocationProvider;

impl CommandInvocationProvider for DefaultInvocationProvider {
    fn enhance(&self, invocation: ConsoleInvocation) -> Box<dyn CommandInvocation> {
        Box::new(invocation)
    }
}

/// Conversion strategy from a raw token to a typed value.
pub trait ValueConverter {
    /// Converts `raw` or reports a binding fault.
    fn convert(&self, raw: &str) -> Result<Value, ParseError>;
}

/// Default converter: passes raw text through as a string value.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringValueConverter;

impl ValueConverter for StringValueConverter {
    fn convert(&self, raw: &str) -> Result<Value, ParseError> {
        Ok(Value::Str(raw.to_string()))
    }
}

/// Completion strategy for one option or argument value.
pub trait OptionCompleter {
    /// Appends candidates matching `prefix` onto the operation.
    fn complete(&self, prefix: &str, operation: &mut CompleteOperation) -> anyhow::Result<()>;
}

/// Default completer producing no candidates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOptionCompleter;

impl OptionCompleter for NoopOptionCompleter {
    fn complete(&self, _prefix: &str, _operation: &mut CompleteOperation) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Validation strategy for one converted option value.
pub trait OptionValidator {
    /// Accepts or rejects `value`.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

/// Default validator accepting every value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOptionValidator;

impl OptionValidator for NoopOptionValidator {
    fn validate(&self, _value: &Value) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Bundle of the conversion, completion, and validation registries handed through populate and
/// completion.
pub struct InvocationProviders {
    converters: ProviderRegistry<dyn ValueConverter>,
    completers: ProviderRegistry<dyn OptionCompleter>,
    validators: ProviderRegistry<dyn OptionValidator>,
}

impl InvocationProviders {
    /// Creates the bundle with the default strategies registered.
    pub fn new() -> Self {
        Self {
            converters: ProviderRegistry::new(Rc::new(StringValueConverter)),
            completers: ProviderRegistry::new(Rc::new(NoopOptionCompleter)),
            validators: ProviderRegistry::new(Rc::new(NoopOptionValidator)),
        }
    }

    /// Converter registry.
    pub fn converters(&self) -> &ProviderRegistry<dyn ValueConverter> {
        &self.converters
    }

    /// Mutable converter registry for setup-time registration.
    pub fn converters_mut(&mut self) -> &mut ProviderRegistry<dyn ValueConverter> {
        &mut self.converters
    }

    /// Completer registry.
    pub fn completers(&self) -> &ProviderRegistry<dyn OptionCompleter> {
        &self.completers
    }

    /// Mutable completer registry for setup-time registration.
    pub fn completers_mut(&mut self) -> &mut ProviderRegistry<dyn OptionCompleter> {
        &mut self.completers
    }

    /// Validator registry.
    pub fn validators(&self) -> &ProviderRegistry<dyn OptionValidator> {
        &self.validators
    }

    /// Mutable validator registry for setup-time registration.
    pub fn validators_mut(&mut self) -> &mut ProviderRegistry<dyn OptionValidator> {
        &mut self.validators
    }
}

impl Default for InvocationProviders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_default() {
        let registry: ProviderRegistry<dyn ValueConverter> =
            ProviderRegistry::new(Rc::new(StringValueConverter));
        assert!(registry.get("custom").is_none());
        let fallback = registry.get_or_default("custom");
        assert_eq!(
            fallback.convert("text").expect("convert"),
            Value::Str("text".to_string())
        );
    }

    #[test]
    fn registering_under_default_name_replaces_the_default() {
        struct Upper;
        impl ValueConverter for Upper {
            fn convert(&self, raw: &str) -> Result<Value, ParseError> {
                Ok(Value::Str(raw.to_uppercase()))
            }
        }

        let mut registry: ProviderRegistry<dyn ValueConverter> =
            ProviderRegistry::new(Rc::new(StringValueConverter));
        registry.register(DEFAULT_PROVIDER_NAME, Rc::new(Upper));
        assert_eq!(
            registry.default_provider().convert("text").expect("convert"),
            Value::Str("TEXT".to_string())
        );
    }
}
