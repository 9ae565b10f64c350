//! Parsing of scripted `--add` and `--delete` arguments.
//!
//! Section and property names are limited to ASCII word characters plus
//! `-`, `<` and `>`. A set argument looks like `section.property = value`
//! where the value is the rest of the line and may be empty. A delete
//! argument is either `section` or `section.property`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

const NAME: &str = r"[A-Za-z0-9_<>\-]+";

static SET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({NAME})\.({NAME})\s*=\s*(.*)$")).unwrap());

static SECTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*({NAME})\s*$")).unwrap());

static QUALIFIED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*({NAME})\.({NAME})\s*$")).unwrap());

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{NAME}$")).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("invalid set syntax '{0}', expected '<section>.<property> = <value>'")]
    InvalidSet(String),
    #[error("invalid delete syntax '{0}', expected '<section>' or '<section>.<property>'")]
    InvalidDelete(String),
    #[error("invalid name '{0}', names cannot be empty, start with '#', ';' or '%', or contain '=', '[' or ']'")]
    InvalidName(String),
}

/// `section.property = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOperation {
    pub section: String,
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOperation {
    Section { section: String },
    Property { section: String, property: String },
}

impl DeleteOperation {
    pub fn section(&self) -> &str {
        match self {
            DeleteOperation::Section { section } | DeleteOperation::Property { section, .. } => {
                section
            }
        }
    }
}

pub fn parse_set(input: &str) -> Result<SetOperation, GrammarError> {
    let caps = SET_PATTERN
        .captures(input)
        .ok_or_else(|| GrammarError::InvalidSet(input.to_string()))?;

    Ok(SetOperation {
        section: caps[1].to_string(),
        property: caps[2].to_string(),
        value: caps[3].trim_end().to_string(),
    })
}

/// Whole-section form wins over the qualified form.
pub fn parse_delete(input: &str) -> Result<DeleteOperation, GrammarError> {
    if let Some(caps) = SECTION_PATTERN.captures(input) {
        return Ok(DeleteOperation::Section {
            section: caps[1].to_string(),
        });
    }

    if let Some(caps) = QUALIFIED_PATTERN.captures(input) {
        return Ok(DeleteOperation::Property {
            section: caps[1].to_string(),
            property: caps[2].to_string(),
        });
    }

    Err(GrammarError::InvalidDelete(input.to_string()))
}

/// Check a section or property name typed at an interactive prompt.
///
/// Looser than the scripted forms: existing files use names such as
/// `kdiff3.args` or `hgext.mq`, so anything is accepted that still reads
/// back as the same header or key.
pub fn validate_name(name: &str) -> Result<&str, GrammarError> {
    let readable = !name.trim().is_empty()
        && !name.starts_with(['#', ';', '%'])
        && !name.contains(['=', '[', ']', '\n', '\r']);
    if readable {
        Ok(name)
    } else {
        Err(GrammarError::InvalidName(name.to_string()))
    }
}
