//! Interactive prompts as a pluggable input source.
//!
//! The core never talks to a terminal directly: commands that need an answer
//! receive a [`Dialog`]. The queue implementation reads scripted responses
//! from `GROVE_DIALOG_RESPONSES`, so every decision stays deterministic in
//! tests and CI.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::errors::{Error, Result};

/// Environment variable holding comma-separated scripted answers.
pub const DIALOG_RESPONSES_VAR: &str = "GROVE_DIALOG_RESPONSES";

pub trait Dialog {
    /// Present `options` and return the index of the chosen one.
    fn choose(&mut self, prompt: &str, options: &[&str]) -> Result<usize>;
}

/// Dialog reading answers from a preloaded queue.
///
/// Answers match either the option text or its 1-based number.
#[derive(Debug, Default)]
pub struct QueueDialog {
    answers: VecDeque<String>,
}

impl QueueDialog {
    pub fn new(answers: Vec<String>) -> Self {
        Self {
            answers: answers.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let raw = std::env::var(DIALOG_RESPONSES_VAR).ok()?;
        Some(Self::new(
            raw.split(',')
                .map(|answer| answer.trim().to_string())
                .filter(|answer| !answer.is_empty())
                .collect(),
        ))
    }
}

impl Dialog for QueueDialog {
    fn choose(&mut self, prompt: &str, options: &[&str]) -> Result<usize> {
        let answer = self.answers.pop_front().ok_or_else(|| {
            Error::user_misuse(format!("no scripted dialog response for: {prompt}"))
        })?;
        resolve_answer(&answer, options)
            .ok_or_else(|| Error::user_misuse(format!("invalid dialog response {answer:?}")))
    }
}

/// Dialog prompting on the terminal with numbered options.
#[derive(Debug, Default)]
pub struct TerminalDialog;

impl Dialog for TerminalDialog {
    fn choose(&mut self, prompt: &str, options: &[&str]) -> Result<usize> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            writeln!(stdout, "{prompt}")?;
            for (index, option) in options.iter().enumerate() {
                writeln!(stdout, "  {}) {option}", index + 1)?;
            }
            write!(stdout, "> ")?;
            stdout.flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Err(Error::user_misuse("no answer given"));
            }
            if let Some(index) = resolve_answer(line.trim(), options) {
                return Ok(index);
            }
            writeln!(stdout, "please answer 1-{}", options.len())?;
        }
    }
}

/// The environment-scripted dialog when configured, the terminal otherwise.
pub fn from_environment() -> Box<dyn Dialog> {
    match QueueDialog::from_env() {
        Some(queue) => Box::new(queue),
        None => Box::new(TerminalDialog),
    }
}

fn resolve_answer(answer: &str, options: &[&str]) -> Option<usize> {
    if let Ok(number) = answer.parse::<usize>() {
        if (1..=options.len()).contains(&number) {
            return Some(number - 1);
        }
        return None;
    }
    options.iter().position(|option| *option == answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_matches_by_text_and_number() {
        let mut dialog = QueueDialog::new(vec!["continue".to_string(), "2".to_string()]);
        let options = ["discard", "continue", "abort"];
        assert_eq!(dialog.choose("what now?", &options).expect("first"), 1);
        assert_eq!(dialog.choose("what now?", &options).expect("second"), 1);
    }

    #[test]
    fn exhausted_queue_is_an_error() {
        let mut dialog = QueueDialog::new(Vec::new());
        assert!(dialog.choose("anything?", &["yes"]).is_err());
    }

    #[test]
    fn out_of_range_number_is_rejected() {
        let mut dialog = QueueDialog::new(vec!["7".to_string()]);
        assert!(dialog.choose("pick", &["a", "b"]).is_err());
    }
}
