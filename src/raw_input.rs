use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

mod literal;
#[cfg(test)]
mod tests;

use literal::{LiteralError, parse_literal};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RenderTarget {
    Structured(Map<String, Value>),
    Text(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not parse raw input as a mapping: {source}")]
pub struct ParseWarning {
    #[source]
    pub source: LiteralError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub target: RenderTarget,
    pub warning: Option<ParseWarning>,
}

impl Interpretation {
    fn text(text: impl Into<String>) -> Self {
        Self {
            target: RenderTarget::Text(text.into()),
            warning: None,
        }
    }
}

pub struct RawInputInterpreter {
    brace_span: Regex,
}

impl RawInputInterpreter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            brace_span: Regex::new(r"(?s)\{.*\}").context("failed to compile brace span regex")?,
        })
    }

    pub fn interpret(&self, value: &Value) -> Interpretation {
        match value {
            Value::Object(map) => Interpretation {
                target: RenderTarget::Structured(map.clone()),
                warning: None,
            },
            Value::String(text) => self.interpret_text(text),
            Value::Null => Interpretation::text(""),
            other => Interpretation::text(other.to_string()),
        }
    }

    /// The span runs from the first `{` to the last `}` in the whole string,
    /// so several objects in one string are captured together.
    pub fn interpret_text(&self, text: &str) -> Interpretation {
        let Some(span) = self.brace_span.find(text) else {
            return Interpretation::text(text);
        };

        match parse_literal(span.as_str()) {
            Ok(Value::Object(map)) => Interpretation {
                target: RenderTarget::Structured(map),
                warning: None,
            },
            Ok(_) => Interpretation::text(text),
            Err(source) => Interpretation {
                target: RenderTarget::Text(text.to_string()),
                warning: Some(ParseWarning { source }),
            },
        }
    }
}
