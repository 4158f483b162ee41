//! Typed binder from parsed lines onto command instances.

use std::rc::Rc;

use console_contract::{
    BoundCommandLine, CommandSchema, OptionSpec, ParseError, ParsedLine, PopulateError, Value,
};

use crate::command::Command;
use crate::pipeline::CommandPopulator;
use crate::providers::InvocationProviders;

/// Reference [`CommandPopulator`] driven by a [`CommandSchema`].
pub struct SchemaPopulator {
    schema: Rc<CommandSchema>,
}

impl SchemaPopulator {
    /// Creates a populator for one schema.
    pub fn new(schema: Rc<CommandSchema>) -> Self {
        Self { schema }
    }
}

impl CommandPopulator for SchemaPopulator {
    fn populate(
        &self,
        command: &mut dyn Command,
        parsed: &ParsedLine,
        providers: &InvocationProviders,
        validate: bool,
    ) -> Result<(), PopulateError> {
        let enforce_required = validate && !parsed.has_override_required();
        let mut bound = BoundCommandLine::default();

        for spec in &self.schema.options {
            let occurrence = parsed.option(&spec.name);
            let value = match occurrence {
                Some(option) => {
                    if spec.takes_value {
                        let raw = option.raw.as_deref().ok_or_else(|| {
                            ParseError::new(format!("option --{} requires a value", spec.name))
                        })?;
                        Some(convert_option(spec, raw, providers)?)
                    } else {
                        Some(Value::Bool(true))
                    }
                }
                None => match &spec.default_value {
                    Some(raw) => Some(convert_option(spec, raw, providers)?),
                    None if spec.required && enforce_required => {
                        return Err(ParseError::new(format!(
                            "option --{} is required",
                            spec.name
                        ))
                        .into());
                    }
                    None => None,
                },
            };
            if let Some(value) = value {
                if validate && occurrence.is_some() {
                    if let Some(validator) = &spec.validator {
                        providers
                            .validators()
                            .get_or_default(validator)
                            .validate(&value)
                            .map_err(PopulateError::Validation)?;
                    }
                }
                bound.insert_option(&spec.name, value);
            }
        }

        for (index, spec) in self.schema.args.iter().enumerate() {
            if spec.repeatable {
                for raw in parsed.arguments.iter().skip(index) {
                    bound.push_argument(convert_argument(spec.kind, &spec.name, raw)?);
                }
                break;
            }
            match parsed.arguments.get(index) {
                Some(raw) => bound.push_argument(convert_argument(spec.kind, &spec.name, raw)?),
                None if spec.required && enforce_required => {
                    return Err(ParseError::new(format!(
                        "argument <{}> is required",
                        spec.name
                    ))
                    .into());
                }
                None => {}
            }
        }

        command.populate(&bound).map_err(PopulateError::Binding)
    }
}

fn convert_option(
    spec: &OptionSpec,
    raw: &str,
    providers: &InvocationProviders,
) -> Result<Value, PopulateError> {
    let converted = match &spec.converter {
        Some(name) => providers.converters().get_or_default(name).convert(raw),
        None => Value::parse(spec.kind, raw),
    };
    converted
        .map_err(|error| {
            ParseError::new(format!("invalid value for --{}: {}", spec.name, error.message))
        })
        .map_err(PopulateError::Binding)
}

fn convert_argument(
    kind: console_contract::ValueKind,
    name: &str,
    raw: &str,
) -> Result<Value, PopulateError> {
    Value::parse(kind, raw)
        .map_err(|error| {
            ParseError::new(format!("invalid value for <{name}>: {}", error.message))
        })
        .map_err(PopulateError::Binding)
}

#[cfg(test)]
mod tests {
    use console_contract::{ArgSpec, OptionSpec, ValidationError, ValueKind};

    use super::*;
    use crate::command::CommandInvocation;
    use crate::pipeline::parser::parse_line;
    use crate::providers::OptionValidator;

    #[derive(Default, Debug)]
    struct Probe {
        name: Option<String>,
        count: Option<i64>,
        loud: bool,
        rest: Vec<String>,
    }

    impl Command for Probe {
        fn populate(&mut self, line: &BoundCommandLine) -> Result<(), ParseError> {
            self.name = line.option_str("name").map(str::to_string);
            self.count = line.option("count").and_then(Value::as_int);
            self.loud = line.flag("loud");
            self.rest = line
                .arguments()
                .iter()
                .map(|value| value.to_string())
                .collect();
            Ok(())
        }

        fn execute(
            &mut self,
            _invocation: Box<dyn CommandInvocation>,
        ) -> anyhow::Result<console_contract::ResultCode> {
            Ok(console_contract::ResultCode::Success)
        }
    }

    struct NonEmpty;

    impl OptionValidator for NonEmpty {
        fn validate(&self, value: &Value) -> Result<(), ValidationError> {
            match value.as_str() {
                Some("") => Err(ValidationError::new("value must not be empty")),
                _ => Ok(()),
            }
        }
    }

    fn schema() -> Rc<CommandSchema> {
        Rc::new(
            CommandSchema::new("greet", "Greets someone.")
                .option(
                    OptionSpec::value("name", ValueKind::String, "Who to greet.")
                        .required()
                        .validator("non-empty"),
                )
                .option(
                    OptionSpec::value("count", ValueKind::Integer, "Repeat count.")
                        .default_value("1"),
                )
                .option(OptionSpec::flag("loud", "Shout."))
                .option(OptionSpec::flag("help", "Show usage.").override_required())
                .arg(ArgSpec::new("suffix", "Trailing text.").repeatable()),
        )
    }

    fn providers() -> InvocationProviders {
        let mut providers = InvocationProviders::new();
        providers
            .validators_mut()
            .register("non-empty", Rc::new(NonEmpty));
        providers
    }

    fn populate(line: &str, validate: bool) -> Result<Probe, PopulateError> {
        let schema = schema();
        let parsed = parse_line(&schema, line).expect("parse");
        let mut probe = Probe::default();
        SchemaPopulator::new(schema).populate(&mut probe, &parsed, &providers(), validate)?;
        Ok(probe)
    }

    #[test]
    fn binds_typed_options_defaults_and_arguments() {
        let probe = populate("greet --name=Bob --loud good day", true).expect("populate");
        assert_eq!(probe.name.as_deref(), Some("Bob"));
        assert_eq!(probe.count, Some(1));
        assert!(probe.loud);
        assert_eq!(probe.rest, ["good", "day"]);
    }

    #[test]
    fn missing_required_option_is_a_binding_fault() {
        let error = populate("greet", true).unwrap_err();
        assert!(matches!(error, PopulateError::Binding(_)));
        assert_eq!(error.to_string(), "option --name is required");
    }

    #[test]
    fn override_option_bypasses_required_checks() {
        let probe = populate("greet --help", true).expect("populate");
        assert_eq!(probe.name, None);
    }

    #[test]
    fn validation_off_skips_required_checks() {
        let probe = populate("greet", false).expect("populate");
        assert_eq!(probe.name, None);
    }

    #[test]
    fn conversion_failure_names_the_option() {
        let error = populate("greet --name=Bob --count=many", true).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid value for --count: not an integer: many"
        );
    }

    #[test]
    fn option_validator_rejection_is_validation_class() {
        let error = populate("greet --name=", true).unwrap_err();
        assert!(matches!(error, PopulateError::Validation(_)));
        assert_eq!(error.to_string(), "value must not be empty");
    }
}
