//! Schema-driven completion-side parser.

use std::rc::Rc;

use console_contract::{
    CommandSchema, CompleteOperation, ParseError, ParsedLine, ParsedOption, PopulateError,
};
use console_line::{split_words, word_at};

use crate::command::Command;
use crate::pipeline::{CommandPopulator, CompletionParser, CompletionTarget, SchemaPopulator};
use crate::providers::InvocationProviders;

/// Reference [`CompletionParser`] driven by a [`CommandSchema`].
pub struct SchemaCompletionParser {
    schema: Rc<CommandSchema>,
}

impl SchemaCompletionParser {
    /// Creates a completion parser for one schema.
    pub fn new(schema: Rc<CommandSchema>) -> Self {
        Self { schema }
    }
}

impl CompletionParser for SchemaCompletionParser {
    fn locate_target(&self, buffer: &str, cursor: usize) -> Result<CompletionTarget, ParseError> {
        let words =
            split_words(buffer).map_err(|error| ParseError::new(error.to_string()))?;
        let cursor = cursor.min(buffer.len());
        let active = word_at(&words, cursor).filter(|word| cursor > word.start);

        let Some(word) = active else {
            // cursor sits on a new word
            let prior: Vec<&str> = words.iter().skip(1).map(|w| w.text.as_str()).collect();
            if let Some(option) = pending_option(&self.schema, &prior) {
                return Ok(CompletionTarget::OptionValue {
                    option,
                    partial: String::new(),
                });
            }
            return Ok(CompletionTarget::Argument {
                index: positional_count(&self.schema, &prior),
                partial: String::new(),
            });
        };

        let position = words
            .iter()
            .position(|candidate| candidate.start == word.start)
            .unwrap_or(0);
        if position == 0 {
            // still inside the command word itself
            return Ok(CompletionTarget::Argument {
                index: 0,
                partial: String::new(),
            });
        }

        let text = word.text.as_str();
        if let Some(body) = text.strip_prefix("--") {
            if let Some((name, partial)) = body.split_once('=') {
                return Ok(CompletionTarget::OptionValue {
                    option: name.to_string(),
                    partial: partial.to_string(),
                });
            }
            return Ok(CompletionTarget::OptionName {
                partial: body.to_string(),
            });
        }
        if text.starts_with('-') {
            return Ok(CompletionTarget::OptionName {
                partial: text.trim_start_matches('-').to_string(),
            });
        }

        let prior: Vec<&str> = words[1..position].iter().map(|w| w.text.as_str()).collect();
        if let Some(option) = pending_option(&self.schema, &prior) {
            return Ok(CompletionTarget::OptionValue {
                option,
                partial: text.to_string(),
            });
        }
        Ok(CompletionTarget::Argument {
            index: positional_count(&self.schema, &prior),
            partial: text.to_string(),
        })
    }

    fn populate_candidates(
        &self,
        target: &CompletionTarget,
        command: &mut dyn Command,
        operation: &mut CompleteOperation,
        providers: &InvocationProviders,
    ) -> anyhow::Result<()> {
        let parsed = lenient_parse(&self.schema, operation.buffer());
        SchemaPopulator::new(Rc::clone(&self.schema))
            .populate(command, &parsed, providers, false)
            .map_err(|error| match error {
                PopulateError::Binding(parse) => parse,
                PopulateError::Validation(validation) => ParseError::new(validation.to_string()),
            })?;

        match target {
            CompletionTarget::OptionName { partial } => {
                for spec in &self.schema.options {
                    if spec.name.starts_with(partial.as_str()) {
                        operation.add_candidate(format!("--{}", spec.name));
                    }
                }
            }
            CompletionTarget::OptionValue { option, partial } => {
                if let Some(completer) = self
                    .schema
                    .find_option(option)
                    .and_then(|spec| spec.completer.as_ref())
                {
                    providers
                        .completers()
                        .get_or_default(completer)
                        .complete(partial, operation)?;
                }
            }
            CompletionTarget::Argument { index, partial } => {
                let spec = self
                    .schema
                    .args
                    .get(*index)
                    .or_else(|| self.schema.args.last().filter(|arg| arg.repeatable));
                if let Some(completer) = spec.and_then(|arg| arg.completer.as_ref()) {
                    providers
                        .completers()
                        .get_or_default(completer)
                        .complete(partial, operation)?;
                }
            }
        }
        Ok(())
    }
}

/// Best-effort parse of the fully typed tokens, skipping the in-progress word and anything
/// the schema does not recognize. Used to inject known values before completing.
fn lenient_parse(schema: &CommandSchema, buffer: &str) -> ParsedLine {
    let words = split_words(buffer).unwrap_or_default();
    let mut tokens: Vec<&str> = words.iter().skip(1).map(|w| w.text.as_str()).collect();
    if !buffer.ends_with(char::is_whitespace) {
        tokens.pop();
    }

    let mut options = Vec::new();
    let mut arguments = Vec::new();
    let mut override_required = false;
    let mut index = 0usize;

    while index < tokens.len() {
        let token = tokens[index];
        if let Some(body) = token.strip_prefix("--").filter(|body| !body.is_empty()) {
            if let Some((name, raw)) = body.split_once('=') {
                if let Some(spec) = schema.find_option(name).filter(|spec| spec.takes_value) {
                    override_required |= spec.override_required;
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: Some(raw.to_string()),
                    });
                }
            } else if let Some(spec) = schema.find_option(body) {
                override_required |= spec.override_required;
                if spec.takes_value {
                    if let Some(raw) = tokens.get(index + 1) {
                        index += 1;
                        options.push(ParsedOption {
                            name: spec.name.clone(),
                            raw: Some(raw.to_string()),
                        });
                    }
                } else {
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: None,
                    });
                }
            }
        } else if let Some(body) = token.strip_prefix('-').filter(|body| !body.is_empty()) {
            let mut shorts = body.chars();
            if let (Some(short), None) = (shorts.next(), shorts.next()) {
                if let Some(spec) = schema.find_short(short) {
                    override_required |= spec.override_required;
                    if spec.takes_value {
                        if let Some(raw) = tokens.get(index + 1) {
                            index += 1;
                            options.push(ParsedOption {
                                name: spec.name.clone(),
                                raw: Some(raw.to_string()),
                            });
                        }
                    } else {
                        options.push(ParsedOption {
                            name: spec.name.clone(),
                            raw: None,
                        });
                    }
                }
            }
        } else {
            arguments.push(token.to_string());
        }
        index += 1;
    }

    ParsedLine::new(schema.name.clone(), options, arguments, override_required)
}

fn positional_count(schema: &CommandSchema, tokens: &[&str]) -> usize {
    let mut count = 0usize;
    let mut index = 0usize;
    while index < tokens.len() {
        let token = tokens[index];
        if let Some(body) = token.strip_prefix("--") {
            if !body.contains('=')
                && schema.find_option(body).is_some_and(|spec| spec.takes_value)
            {
                index += 1;
            }
        } else if let Some(body) = token.strip_prefix('-').filter(|body| !body.is_empty()) {
            let mut shorts = body.chars();
            if let (Some(short), None) = (shorts.next(), shorts.next()) {
                if schema.find_short(short).is_some_and(|spec| spec.takes_value) {
                    index += 1;
                }
            }
        } else {
            count += 1;
        }
        index += 1;
    }
    count
}

fn pending_option(schema: &CommandSchema, tokens: &[&str]) -> Option<String> {
    let last = tokens.last()?;
    if let Some(body) = last.strip_prefix("--") {
        if body.is_empty() || body.contains('=') {
            return None;
        }
        return schema
            .find_option(body)
            .filter(|spec| spec.takes_value)
            .map(|spec| spec.name.clone());
    }
    if let Some(body) = last.strip_prefix('-') {
        let mut shorts = body.chars();
        if let (Some(short), None) = (shorts.next(), shorts.next()) {
            return schema
                .find_short(short)
                .filter(|spec| spec.takes_value)
                .map(|spec| spec.name.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use console_contract::{ArgSpec, BoundCommandLine, OptionSpec, ResultCode, ValueKind};

    use super::*;
    use crate::command::CommandInvocation;
    use crate::providers::OptionCompleter;

    #[derive(Default)]
    struct Probe {
        name: Option<String>,
    }

    impl Command for Probe {
        fn populate(&mut self, line: &BoundCommandLine) -> Result<(), ParseError> {
            self.name = line.option_str("name").map(str::to_string);
            Ok(())
        }

        fn execute(
            &mut self,
            _invocation: Box<dyn CommandInvocation>,
        ) -> anyhow::Result<ResultCode> {
            Ok(ResultCode::Success)
        }
    }

    struct StaticCompleter(&'static [&'static str]);

    impl OptionCompleter for StaticCompleter {
        fn complete(&self, prefix: &str, operation: &mut CompleteOperation) -> anyhow::Result<()> {
            for item in self.0 {
                if item.starts_with(prefix) {
                    operation.add_candidate(*item);
                }
            }
            Ok(())
        }
    }

    fn schema() -> Rc<CommandSchema> {
        Rc::new(
            CommandSchema::new("greet", "Greets someone.")
                .option(
                    OptionSpec::value("name", ValueKind::String, "Who to greet.")
                        .short('n')
                        .completer("names"),
                )
                .option(OptionSpec::flag("loud", "Shout."))
                .arg(ArgSpec::new("suffix", "Trailing text.").repeatable().completer("suffixes")),
        )
    }

    fn providers() -> InvocationProviders {
        let mut providers = InvocationProviders::new();
        providers
            .completers_mut()
            .register("names", Rc::new(StaticCompleter(&["Alice", "Bob"])));
        providers
            .completers_mut()
            .register("suffixes", Rc::new(StaticCompleter(&["morning", "night"])));
        providers
    }

    fn locate(buffer: &str) -> CompletionTarget {
        SchemaCompletionParser::new(schema())
            .locate_target(buffer, buffer.len())
            .expect("locate")
    }

    #[test]
    fn locates_option_name_targets() {
        assert_eq!(
            locate("greet --lo"),
            CompletionTarget::OptionName {
                partial: "lo".to_string()
            }
        );
        assert_eq!(
            locate("greet -"),
            CompletionTarget::OptionName {
                partial: String::new()
            }
        );
    }

    #[test]
    fn locates_option_value_targets() {
        assert_eq!(
            locate("greet --name=B"),
            CompletionTarget::OptionValue {
                option: "name".to_string(),
                partial: "B".to_string()
            }
        );
        assert_eq!(
            locate("greet --name "),
            CompletionTarget::OptionValue {
                option: "name".to_string(),
                partial: String::new()
            }
        );
        assert_eq!(
            locate("greet -n Bo"),
            CompletionTarget::OptionValue {
                option: "name".to_string(),
                partial: "Bo".to_string()
            }
        );
    }

    #[test]
    fn locates_argument_targets_with_positions() {
        assert_eq!(
            locate("greet "),
            CompletionTarget::Argument {
                index: 0,
                partial: String::new()
            }
        );
        assert_eq!(
            locate("greet --name Bob good "),
            CompletionTarget::Argument {
                index: 1,
                partial: String::new()
            }
        );
        assert_eq!(
            locate("greet mor"),
            CompletionTarget::Argument {
                index: 0,
                partial: "mor".to_string()
            }
        );
    }

    #[test]
    fn malformed_buffer_is_a_parse_error() {
        let error = SchemaCompletionParser::new(schema())
            .locate_target("greet \"unterminated", 19)
            .unwrap_err();
        assert_eq!(error.message, "unterminated quoted string");
    }

    #[test]
    fn option_name_candidates_match_prefix() {
        let mut operation = CompleteOperation::new("greet --l", 9);
        let target = locate("greet --l");
        let mut probe = Probe::default();
        SchemaCompletionParser::new(schema())
            .populate_candidates(&target, &mut probe, &mut operation, &providers())
            .expect("complete");
        assert_eq!(operation.candidates(), ["--loud"]);
    }

    #[test]
    fn option_value_candidates_come_from_named_completer() {
        let buffer = "greet --name B";
        let mut operation = CompleteOperation::new(buffer, buffer.len());
        let target = locate(buffer);
        let mut probe = Probe::default();
        SchemaCompletionParser::new(schema())
            .populate_candidates(&target, &mut probe, &mut operation, &providers())
            .expect("complete");
        assert_eq!(operation.candidates(), ["Bob"]);
    }

    #[test]
    fn argument_candidates_use_the_argument_completer() {
        let buffer = "greet --name=Bob mor";
        let mut operation = CompleteOperation::new(buffer, buffer.len());
        let target = locate(buffer);
        let mut probe = Probe::default();
        SchemaCompletionParser::new(schema())
            .populate_candidates(&target, &mut probe, &mut operation, &providers())
            .expect("complete");
        assert_eq!(operation.candidates(), ["morning"]);
        // already-typed values were injected before completing
        assert_eq!(probe.name.as_deref(), Some("Bob"));
    }
}
