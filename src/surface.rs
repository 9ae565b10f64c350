//! The interaction surface: every prompt, status line and warning the editor
//! produces goes through [`Surface`], never straight to stdin/stdout.
//!
//! [`TerminalSurface`] talks to a reader and two writers (stdin, stdout and
//! stderr in the binary). [`ScriptedSurface`] replays canned answers and keeps
//! a transcript, for tests and for driving the editor programmatically.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::colors::Colors;
use crate::error::{Error, Result};

/// One selectable answer of a choice prompt, e.g. key `l` for `reload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    key: String,
    label: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `yes`/`no` answers, in that order.
    pub fn yes_no() -> [Choice; 2] {
        [Choice::new("y", "yes"), Choice::new("n", "no")]
    }
}

/// Map a typed answer to a choice index. An empty answer selects `default`;
/// otherwise the key or the full label must match (ignoring case).
pub fn match_choice(choices: &[Choice], answer: &str, default: usize) -> Option<usize> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default);
    }
    choices.iter().position(|c| {
        c.key.eq_ignore_ascii_case(answer) || c.label.eq_ignore_ascii_case(answer)
    })
}

pub trait Surface {
    /// Ask until one of `choices` is picked and return its index.
    fn prompt_choice(&mut self, message: &str, choices: &[Choice], default: usize)
        -> Result<usize>;

    /// Ask for free text; an empty answer yields `default`.
    fn prompt_text(&mut self, message: &str, default: &str) -> Result<String>;

    fn status(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    /// Ask a yes/no question where `no` is the default.
    fn confirm(&mut self, message: &str) -> Result<bool> {
        Ok(self.prompt_choice(message, &Choice::yes_no(), 1)? == 0)
    }
}

pub struct TerminalSurface<R, W, E> {
    input: R,
    output: W,
    errors: E,
    colors: Colors,
}

impl TerminalSurface<io::StdinLock<'static>, io::Stdout, io::Stderr> {
    pub fn stdio(colors: Colors) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), io::stderr(), colors)
    }
}

impl<R: BufRead, W: Write, E: Write> TerminalSurface<R, W, E> {
    pub fn new(input: R, output: W, errors: E, colors: Colors) -> Self {
        Self {
            input,
            output,
            errors,
            colors,
        }
    }

    fn ask(&mut self, message: &str) -> Result<String> {
        write!(
            self.output,
            "{} ",
            self.colors.paint(self.colors.prompt, message)
        )
        .and_then(|()| self.output.flush())
        .map_err(|e| Error::io("<stdout>", e))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::io("<stdin>", e))?;
        if read == 0 {
            return Err(Error::Interrupted);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl<R: BufRead, W: Write, E: Write> Surface for TerminalSurface<R, W, E> {
    fn prompt_choice(
        &mut self,
        message: &str,
        choices: &[Choice],
        default: usize,
    ) -> Result<usize> {
        loop {
            let answer = self.ask(message)?;
            if let Some(index) = match_choice(choices, &answer, default) {
                return Ok(index);
            }
            let keys: Vec<&str> = choices.iter().map(Choice::key).collect();
            writeln!(self.output, "unrecognized response, use one of: {}", keys.join(" "))
                .map_err(|e| Error::io("<stdout>", e))?;
        }
    }

    fn prompt_text(&mut self, message: &str, default: &str) -> Result<String> {
        let answer = self.ask(message)?;
        if answer.trim().is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer.trim().to_string())
        }
    }

    fn status(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{message}") {
            debug!(error = %e, "status line lost");
        }
    }

    fn warn(&mut self, message: &str) {
        let painted = self.colors.paint(self.colors.warning, message);
        if let Err(e) = writeln!(self.errors, "{painted}") {
            debug!(error = %e, "warning lost");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Prompt(String),
    Status(String),
    Warn(String),
}

/// Replays queued answers; runs out with [`Error::Interrupted`].
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    answers: VecDeque<String>,
    transcript: Vec<Event>,
}

impl ScriptedSurface {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Event] {
        &self.transcript
    }

    pub fn statuses(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|e| match e {
                Event::Status(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|e| match e {
                Event::Warn(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|e| match e {
                Event::Prompt(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, message: &str) -> Result<String> {
        self.transcript.push(Event::Prompt(message.to_string()));
        self.answers.pop_front().ok_or(Error::Interrupted)
    }
}

impl Surface for ScriptedSurface {
    fn prompt_choice(
        &mut self,
        message: &str,
        choices: &[Choice],
        default: usize,
    ) -> Result<usize> {
        loop {
            let answer = self.next_answer(message)?;
            if let Some(index) = match_choice(choices, &answer, default) {
                return Ok(index);
            }
            self.transcript
                .push(Event::Warn(format!("unrecognized response '{answer}'")));
        }
    }

    fn prompt_text(&mut self, message: &str, default: &str) -> Result<String> {
        let answer = self.next_answer(message)?;
        if answer.trim().is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer.trim().to_string())
        }
    }

    fn status(&mut self, message: &str) {
        self.transcript.push(Event::Status(message.to_string()));
    }

    fn warn(&mut self, message: &str) {
        self.transcript.push(Event::Warn(message.to_string()));
    }
}
