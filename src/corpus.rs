use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::CorpusLoadError;


const RAW_INPUT_FIELD: &str = "raw_input";
const REASONING_FIELD: &str = "reasoning";

#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub section_name: String,
    pub raw_input: Value,
    pub reasoning: String,
    pub structured_output: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct CorpusRequest {
    pub request_id: String,
    pub sections: Vec<CorpusEntry>,
}

impl CorpusRequest {
    pub fn section(&self, name: &str) -> Option<&CorpusEntry> {
        self.sections.iter().find(|entry| entry.section_name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn first_section(&self) -> &CorpusEntry {
        // Non-empty by construction in `Corpus::from_value`.
        &self.sections[0]
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|entry| entry.section_name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Corpus {
    requests: Vec<CorpusRequest>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self, CorpusLoadError> {
        let raw = fs::read(path).map_err(|source| CorpusLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_slice(&raw).map_err(|source| CorpusLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CorpusLoadError> {
        let Value::Object(root) = value else {
            return Err(CorpusLoadError::NotAnObject);
        };
        if root.is_empty() {
            return Err(CorpusLoadError::Empty);
        }

        let mut requests = Vec::with_capacity(root.len());
        for (request_id, sections_value) in root {
            let Value::Object(sections_map) = sections_value else {
                return Err(CorpusLoadError::InvalidRequest { request_id });
            };
            if sections_map.is_empty() {
                return Err(CorpusLoadError::NoSections { request_id });
            }

            let mut sections = Vec::with_capacity(sections_map.len());
            for (section_name, entry_value) in sections_map {
                let Value::Object(fields) = entry_value else {
                    return Err(CorpusLoadError::InvalidEntry {
                        request_id,
                        section: section_name,
                    });
                };
                sections.push(build_entry(section_name, fields));
            }

            requests.push(CorpusRequest {
                request_id,
                sections,
            });
        }

        Ok(Self { requests })
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn entry_count(&self) -> usize {
        self.requests.iter().map(|request| request.sections.len()).sum()
    }

    pub fn requests(&self) -> &[CorpusRequest] {
        &self.requests
    }

    pub fn request(&self, index: usize) -> Option<&CorpusRequest> {
        self.requests.get(index)
    }

    pub fn position_of(&self, request_id: &str) -> Option<usize> {
        self.requests
            .iter()
            .position(|request| request.request_id == request_id)
    }

    pub fn find(&self, request_id: &str) -> Option<&CorpusRequest> {
        self.position_of(request_id)
            .and_then(|index| self.requests.get(index))
    }
}

fn build_entry(section_name: String, mut fields: Map<String, Value>) -> CorpusEntry {
    let raw_input = fields
        .shift_remove(RAW_INPUT_FIELD)
        .unwrap_or_else(|| Value::String(String::new()));
    let reasoning = match fields.shift_remove(REASONING_FIELD) {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    CorpusEntry {
        section_name,
        raw_input,
        reasoning,
        structured_output: fields,
    }
}
