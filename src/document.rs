//! In-memory model of one hgrc file.
//!
//! The document keeps every line it was parsed from, so rendering an
//! unmodified document reproduces the input. Edits only touch the lines they
//! concern: changing a value rewrites that entry, new properties are appended
//! to the end of their section, new sections to the end of the file.
//!
//! Supported syntax:
//! - `[section]` headers (optionally followed by a comment)
//! - `key = value` entries
//! - indented continuation lines directly after an entry (multi-line values)
//! - `#` and `;` comments, `%include` and `%unset` directives (kept as-is)
//!
//! A section header may appear more than once. All blocks with the same name
//! form one logical section and the last assignment of a key wins.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tidy::tidy;

static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\[\]]+)\]\s*(?:[#;].*)?$").unwrap());

static ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=\s\[][^=]*?)\s*=\s*(.*)$").unwrap());

/// Indentation used when rendering continuation lines of edited values.
const CONTINUATION_INDENT: &str = "    ";

/// Location and reason of a malformed line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Blank(String),
    /// Comments and `%` directives
    Comment(String),
    Entry(Entry),
}

impl Line {
    fn is_blank(&self) -> bool {
        matches!(self, Line::Blank(_))
    }

    /// `#`/`;` comment, as opposed to a `%` directive
    fn is_remark(&self) -> bool {
        matches!(self, Line::Comment(raw) if raw.trim_start().starts_with(['#', ';']))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    /// Source text including continuation lines, dropped once the value is edited
    raw: Option<Vec<String>>,
}

impl Entry {
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            raw: None,
        }
    }

    fn render_into(&self, out: &mut Vec<String>) {
        if let Some(raw) = &self.raw {
            out.extend(raw.iter().cloned());
            return;
        }

        let mut parts = self.value.split('\n');
        let first = parts.next().unwrap_or_default();
        if first.is_empty() {
            out.push(format!("{} =", self.key));
        } else {
            out.push(format!("{} = {}", self.key, first));
        }
        for rest in parts {
            out.push(format!("{CONTINUATION_INDENT}{rest}"));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    name: String,
    header: String,
    lines: Vec<Line>,
}

impl Block {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            header: format!("[{name}]"),
            lines: Vec::new(),
        }
    }

    /// Index just past the last non-blank line, so new entries sit above
    /// the blank lines that separate this block from the next one.
    fn append_position(&self) -> usize {
        self.lines
            .iter()
            .rposition(|line| !line.is_blank())
            .map_or(0, |idx| idx + 1)
    }
}

/// Ordered sections of `key = value` properties, with a dirty flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    /// Comments and blank lines before the first header
    preamble: Vec<Line>,
    blocks: Vec<Block>,
    eol: &'static str,
    final_newline: bool,
    dirty: bool,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            preamble: Vec::new(),
            blocks: Vec::new(),
            eol: "\n",
            final_newline: true,
            dirty: false,
        }
    }
}

impl ConfigDocument {
    /// Load the file at `path`. A missing file yields an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no file, starting empty");
            return Ok(Self::default());
        }

        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            Error::Parse {
                path: path.to_path_buf(),
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                message: "invalid UTF-8".into(),
            }
        })?;
        let doc = Self::parse(&content).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })?;
        debug!(
            path = %path.display(),
            sections = doc.blocks.len(),
            "loaded configuration"
        );
        Ok(doc)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, SyntaxError> {
        let mut doc = Self {
            eol: if text.contains("\r\n") { "\r\n" } else { "\n" },
            final_newline: text.is_empty() || text.ends_with('\n'),
            ..Self::default()
        };

        for (idx, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                doc.current_lines().push(Line::Blank(raw.to_string()));
                continue;
            }

            if raw.starts_with([' ', '\t']) {
                if let Some(Line::Entry(entry)) = doc.current_lines().last_mut() {
                    entry.value.push('\n');
                    entry.value.push_str(trimmed);
                    if let Some(lines) = entry.raw.as_mut() {
                        lines.push(raw.to_string());
                    }
                    continue;
                }
            }

            if trimmed.starts_with(['#', ';', '%']) {
                doc.current_lines().push(Line::Comment(raw.to_string()));
            } else if let Some(caps) = HEADER_PATTERN.captures(trimmed) {
                doc.blocks.push(Block {
                    name: caps[1].trim().to_string(),
                    header: raw.to_string(),
                    lines: Vec::new(),
                });
            } else if let Some(caps) = ENTRY_PATTERN.captures(trimmed) {
                if doc.blocks.is_empty() {
                    return Err(SyntaxError {
                        line: idx + 1,
                        message: "property outside of a section".into(),
                    });
                }
                doc.current_lines().push(Line::Entry(Entry {
                    key: caps[1].to_string(),
                    value: caps[2].to_string(),
                    raw: Some(vec![raw.to_string()]),
                }));
            } else {
                return Err(SyntaxError {
                    line: idx + 1,
                    message: format!("cannot parse '{trimmed}'"),
                });
            }
        }

        Ok(doc)
    }

    fn current_lines(&mut self) -> &mut Vec<Line> {
        match self.blocks.last_mut() {
            Some(block) => &mut block.lines,
            None => &mut self.preamble,
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.final_newline = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Section names in order of first appearance
    pub fn sections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            if !names.contains(&block.name.as_str()) {
                names.push(&block.name);
            }
        }
        names
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.blocks.iter().any(|b| b.name == name)
    }

    fn entries(&self, section: &str) -> Vec<&Entry> {
        self.blocks
            .iter()
            .filter(|b| b.name == section)
            .flat_map(|b| b.lines.iter())
            .filter_map(|line| match line {
                Line::Entry(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    /// Property names of `section` in order of first appearance
    pub fn properties(&self, section: &str) -> Result<Vec<&str>> {
        if !self.has_section(section) {
            return Err(Error::NoSuchSection {
                section: section.to_string(),
            });
        }
        let mut keys: Vec<&str> = Vec::new();
        for entry in self.entries(section) {
            if !keys.contains(&entry.key.as_str()) {
                keys.push(&entry.key);
            }
        }
        Ok(keys)
    }

    pub fn has_property(&self, section: &str, property: &str) -> bool {
        self.entries(section).iter().any(|e| e.key == property)
    }

    pub fn get(&self, section: &str, property: &str) -> Result<&str> {
        if !self.has_section(section) {
            return Err(Error::NoSuchSection {
                section: section.to_string(),
            });
        }
        self.entries(section)
            .into_iter()
            .filter(|e| e.key == property)
            .last()
            .map(|e| e.value.as_str())
            .ok_or_else(|| Error::NoSuchProperty {
                section: section.to_string(),
                property: property.to_string(),
            })
    }

    /// Append an empty section unless one with this name exists.
    /// Returns whether a section was added.
    pub fn add_section(&mut self, name: &str) -> bool {
        if self.has_section(name) {
            return false;
        }

        let has_content = !self.blocks.is_empty() || self.preamble.iter().any(|l| !l.is_blank());
        let lines = self.current_lines();
        if has_content && !lines.last().is_some_and(Line::is_blank) {
            lines.push(Line::Blank(String::new()));
        }
        self.blocks.push(Block::new(name));
        self.touch();
        true
    }

    /// Set `section.property`, creating the section if needed. An existing
    /// property keeps its position; a new one goes at the end of the section.
    pub fn set(&mut self, section: &str, property: &str, value: &str) {
        self.add_section(section);

        let existing = self
            .blocks
            .iter_mut()
            .rev()
            .filter(|b| b.name == section)
            .flat_map(|b| b.lines.iter_mut().rev())
            .find_map(|line| match line {
                Line::Entry(entry) if entry.key == property => Some(entry),
                _ => None,
            });

        match existing {
            Some(entry) => {
                if entry.value != value {
                    entry.value = value.to_string();
                    entry.raw = None;
                }
            }
            None => {
                if let Some(block) = self.blocks.iter_mut().rev().find(|b| b.name == section) {
                    let at = block.append_position();
                    block
                        .lines
                        .insert(at, Line::Entry(Entry::new(property, value)));
                }
            }
        }
        self.touch();
    }

    /// Remove every block of `name`, together with the comment lines
    /// directly above each of its headers. Returns false if there was none.
    pub fn remove_section(&mut self, name: &str) -> bool {
        if !self.has_section(name) {
            return false;
        }

        let mut blocks = std::mem::take(&mut self.blocks).into_iter().peekable();
        while let Some(block) = blocks.next() {
            if block.name != name {
                self.blocks.push(block);
                continue;
            }

            let lines = self.current_lines();
            while lines.last().is_some_and(Line::is_remark) {
                lines.pop();
            }
            // comments closing the block describe the header after it
            if blocks.peek().is_some() {
                let keep = block.lines.iter().rev().take_while(|l| l.is_remark()).count();
                let tail = block.lines[block.lines.len() - keep..].to_vec();
                self.current_lines().extend(tail);
            }
        }

        let lines = self.current_lines();
        while lines.last().is_some_and(Line::is_blank) {
            lines.pop();
        }
        self.touch();
        true
    }

    /// Remove every assignment of `section.property`. Returns false if the
    /// section or the property is absent.
    pub fn remove_property(&mut self, section: &str, property: &str) -> bool {
        let mut removed = false;
        for block in self.blocks.iter_mut().filter(|b| b.name == section) {
            let before = block.lines.len();
            block
                .lines
                .retain(|line| !matches!(line, Line::Entry(e) if e.key == property));
            removed |= block.lines.len() != before;
        }
        if removed {
            self.touch();
        }
        removed
    }

    /// True when the document has no sections and nothing but blank lines.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.preamble.iter().all(Line::is_blank)
    }

    pub fn render(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        render_lines(&self.preamble, &mut out);
        for block in &self.blocks {
            out.push(block.header.clone());
            render_lines(&block.lines, &mut out);
        }

        let mut text = out.join(self.eol);
        if self.final_newline && !out.is_empty() {
            text.push_str(self.eol);
        }
        text
    }

    /// [`render`](Self::render) followed by the layout clean-up in [`tidy`].
    pub fn render_pretty(&self) -> String {
        let text = tidy(&self.render());
        if self.eol == "\n" {
            text
        } else {
            text.replace('\n', self.eol)
        }
    }

    /// Write the rendered document to `path` and clear the dirty flag.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        let text = self.render();
        self.write_text(path, &text)
    }

    /// Write the tidied rendering to `path` and clear the dirty flag.
    pub fn save_pretty(&mut self, path: &Path) -> Result<()> {
        let text = self.render_pretty();
        self.write_text(path, &text)
    }

    fn write_text(&mut self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "wrote configuration");
        self.dirty = false;
        Ok(())
    }
}

fn render_lines(lines: &[Line], out: &mut Vec<String>) {
    for line in lines {
        match line {
            Line::Blank(raw) | Line::Comment(raw) => out.push(raw.clone()),
            Line::Entry(entry) => entry.render_into(out),
        }
    }
}
