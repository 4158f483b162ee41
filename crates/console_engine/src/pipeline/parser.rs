//! Schema-driven line parser.

use std::rc::Rc;

use console_contract::{CommandSchema, ParseError, ParsedLine, ParsedOption};

use crate::command::LINE_SEPARATOR;
use crate::pipeline::{
    CommandLineParser, CommandPopulator, CompletionParser, SchemaCompletionParser, SchemaPopulator,
};

/// Reference [`CommandLineParser`] driven entirely by a [`CommandSchema`].
pub struct SchemaLineParser {
    schema: Rc<CommandSchema>,
    populator: SchemaPopulator,
    completion: SchemaCompletionParser,
}

impl SchemaLineParser {
    /// Creates the parser, populator, and completion parser for one schema.
    pub fn new(schema: Rc<CommandSchema>) -> Self {
        Self {
            populator: SchemaPopulator::new(Rc::clone(&schema)),
            completion: SchemaCompletionParser::new(Rc::clone(&schema)),
            schema,
        }
    }
}

impl CommandLineParser for SchemaLineParser {
    fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    fn parse(&self, line: &str) -> Result<ParsedLine, ParseError> {
        parse_line(&self.schema, line)
    }

    fn populator(&self) -> &dyn CommandPopulator {
        &self.populator
    }

    fn completion_parser(&self) -> &dyn CompletionParser {
        &self.completion
    }

    fn help_text(&self) -> String {
        render_help(&self.schema)
    }
}

pub(crate) fn parse_line(schema: &CommandSchema, line: &str) -> Result<ParsedLine, ParseError> {
    let words =
        console_line::split_words(line).map_err(|error| ParseError::new(error.to_string()))?;
    let Some((first, rest)) = words.split_first() else {
        return Err(ParseError::new("empty command line"));
    };
    if first.text != schema.name {
        return Err(ParseError::new(format!(
            "line does not start with {}",
            schema.name
        )));
    }

    let tokens: Vec<&str> = rest.iter().map(|word| word.text.as_str()).collect();
    let mut options = Vec::new();
    let mut arguments: Vec<String> = Vec::new();
    let mut override_required = false;
    let mut index = 0usize;

    while index < tokens.len() {
        let token = tokens[index];
        if let Some(body) = token.strip_prefix("--").filter(|body| !body.is_empty()) {
            if let Some((name, raw)) = body.split_once('=') {
                let spec = schema
                    .find_option(name)
                    .ok_or_else(|| ParseError::new(format!("unknown option: --{name}")))?;
                if !spec.takes_value {
                    return Err(ParseError::new(format!(
                        "option --{name} does not take a value"
                    )));
                }
                override_required |= spec.override_required;
                options.push(ParsedOption {
                    name: spec.name.clone(),
                    raw: Some(raw.to_string()),
                });
            } else {
                let spec = schema
                    .find_option(body)
                    .ok_or_else(|| ParseError::new(format!("unknown option: --{body}")))?;
                override_required |= spec.override_required;
                if spec.takes_value {
                    index += 1;
                    let raw = tokens.get(index).ok_or_else(|| {
                        ParseError::new(format!("option --{body} requires a value"))
                    })?;
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: Some(raw.to_string()),
                    });
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
                let spec = schema
                    .find_short(short)
                    .ok_or_else(|| ParseError::new(format!("unknown option: -{short}")))?;
                override_required |= spec.override_required;
                if spec.takes_value {
                    index += 1;
                    let raw = tokens.get(index).ok_or_else(|| {
                        ParseError::new(format!("option -{short} requires a value"))
                    })?;
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: Some(raw.to_string()),
                    });
                } else {
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: None,
                    });
                }
            } else {
                // grouped shorts: flags only
                for short in body.chars() {
                    let spec = schema
                        .find_short(short)
                        .ok_or_else(|| ParseError::new(format!("unknown option: -{short}")))?;
                    if spec.takes_value {
                        return Err(ParseError::new(format!(
                            "option -{short} requires a value and cannot be grouped"
                        )));
                    }
                    override_required |= spec.override_required;
                    options.push(ParsedOption {
                        name: spec.name.clone(),
                        raw: None,
                    });
                }
            }
        } else {
            arguments.push(token.to_string());
        }
        index += 1;
    }

    if !arguments.is_empty() {
        if schema.args.is_empty() {
            return Err(ParseError::new(format!(
                "{} does not accept arguments",
                schema.name
            )));
        }
        let repeatable_last = schema.args.last().is_some_and(|arg| arg.repeatable);
        if arguments.len() > schema.args.len() && !repeatable_last {
            return Err(ParseError::new(format!(
                "unexpected argument: {}",
                arguments[schema.args.len()]
            )));
        }
    }

    Ok(ParsedLine::new(
        schema.name.clone(),
        options,
        arguments,
        override_required,
    ))
}

fn render_help(schema: &CommandSchema) -> String {
    let mut usage = format!("usage: {}", schema.name);
    if !schema.options.is_empty() {
        usage.push_str(" [options]");
    }
    for arg in &schema.args {
        if arg.required {
            usage.push_str(&format!(" <{}>", arg.name));
        } else {
            usage.push_str(&format!(" [{}]", arg.name));
        }
        if arg.repeatable {
            usage.push_str("...");
        }
    }

    let mut lines = vec![schema.summary.clone(), usage];
    if !schema.options.is_empty() {
        let labels: Vec<String> = schema
            .options
            .iter()
            .map(|option| match option.short {
                Some(short) => format!("-{short}, --{}", option.name),
                None => format!("    --{}", option.name),
            })
            .collect();
        let longest = labels.iter().map(String::len).max().unwrap_or(0);
        for (label, option) in labels.iter().zip(&schema.options) {
            lines.push(format!("  {label:<longest$}  {}", option.summary));
        }
    }
    lines.join(LINE_SEPARATOR)
}
