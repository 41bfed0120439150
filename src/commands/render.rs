use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::EvaluationRecord;
use crate::raw_input::{RawInputInterpreter, RenderTarget};
use crate::session::SessionController;

#[derive(Debug, Serialize)]
pub struct EntryView<'a> {
    pub request_id: &'a str,
    pub request_number: usize,
    pub request_total: usize,
    pub sections: Vec<&'a str>,
    pub section: &'a str,
    pub raw_input: RenderTarget,
    pub raw_input_warning: Option<String>,
    pub reasoning: &'a str,
    pub structured_output: &'a Map<String, Value>,
    pub evaluation: Option<&'a EvaluationRecord>,
}

impl<'a> EntryView<'a> {
    pub fn build(session: &'a SessionController<'_>, interpreter: &RawInputInterpreter) -> Self {
        let request = session.current_request();
        let entry = session.current_entry();
        let interpretation = interpreter.interpret(&entry.raw_input);

        Self {
            request_id: &request.request_id,
            request_number: session.cursor().request_index + 1,
            request_total: session.corpus().request_count(),
            sections: request.section_names().collect(),
            section: &entry.section_name,
            raw_input: interpretation.target,
            raw_input_warning: interpretation.warning.map(|warning| warning.to_string()),
            reasoning: &entry.reasoning,
            structured_output: &entry.structured_output,
            evaluation: session.existing_record(),
        }
    }
}

pub fn write_entry_text<W: Write>(output: &mut W, view: &EntryView<'_>) -> Result<()> {
    writeln!(
        output,
        "Request {}/{}: {}",
        view.request_number, view.request_total, view.request_id
    )?;

    let sections: Vec<String> = view
        .sections
        .iter()
        .map(|name| {
            if *name == view.section {
                format!("[{name}]")
            } else {
                (*name).to_string()
            }
        })
        .collect();
    writeln!(output, "Sections: {}", sections.join(" "))?;

    writeln!(output, "-- Raw input --")?;
    match &view.raw_input {
        RenderTarget::Structured(map) => {
            writeln!(output, "{}", serde_json::to_string_pretty(map)?)?;
        }
        RenderTarget::Text(text) => writeln!(output, "{text}")?,
    }
    if let Some(warning) = &view.raw_input_warning {
        writeln!(output, "warning: {warning}")?;
    }

    writeln!(output, "-- Reasoning --")?;
    writeln!(output, "{}", view.reasoning)?;

    writeln!(output, "-- Structured output --")?;
    writeln!(
        output,
        "{}",
        serde_json::to_string_pretty(view.structured_output)?
    )?;

    match view.evaluation {
        Some(record) if record.comment.is_empty() => {
            writeln!(output, "-- Saved evaluation: {} --", record.rating)?;
        }
        Some(record) => {
            writeln!(
                output,
                "-- Saved evaluation: {} ({}) --",
                record.rating, record.comment
            )?;
        }
        None => writeln!(output, "-- Not yet evaluated --")?,
    }

    output.flush()?;
    Ok(())
}
