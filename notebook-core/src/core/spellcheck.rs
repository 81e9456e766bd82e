//! Spell checking through an external `aspell` process.
//!
//! Each query runs the checker synchronously with a time limit. A missing
//! binary or an expired limit is reported as an error for the caller to show;
//! it never takes the editor down.

use std::io::{ErrorKind, Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use crate::{NotebookError, NotebookSettings, Result};

/// Time limit for a single-word suggestion lookup.
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the external spell checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellChecker {
    binary: String,
    timeout: Duration,
    suggestion_limit: usize,
}

impl SpellChecker {
    pub fn new(binary: impl Into<String>, timeout: Duration, suggestion_limit: usize) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            suggestion_limit,
        }
    }

    pub fn from_settings(settings: &NotebookSettings) -> Self {
        Self::new(
            settings.spellcheck_binary.clone(),
            settings.spellcheck_timeout(),
            settings.suggestion_limit,
        )
    }

    /// Misspelled words of `text` with their byte offsets, in text order.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::ToolUnavailable`] if the checker is not
    /// installed or fails, and [`NotebookError::ToolTimedOut`] if it does not
    /// answer in time.
    pub fn misspelled_words(&self, text: &str) -> Result<Vec<(String, usize)>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let output = self.run(&["list"], text, self.timeout)?;
        let words = parse_word_list(&output);
        log::debug!("Spell check found {} misspelled words", words.len());
        Ok(locate_words(text, &words))
    }

    /// Replacement candidates for `word`, best first.
    ///
    /// # Errors
    ///
    /// Same as [`misspelled_words`](Self::misspelled_words).
    pub fn suggestions(&self, word: &str) -> Result<Vec<String>> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(Vec::new());
        }
        // `^` makes aspell treat the rest of the line as text, never a command.
        let output = self.run(&["-a"], &format!("^{word}\n"), SUGGESTION_TIMEOUT.min(self.timeout))?;
        Ok(parse_suggestions(&output, self.suggestion_limit))
    }

    fn run(&self, args: &[&str], input: &str, timeout: Duration) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    NotebookError::ToolUnavailable(format!(
                        "{} is not installed; install aspell to enable spell checking",
                        self.binary
                    ))
                } else {
                    NotebookError::ToolUnavailable(format!("{}: {e}", self.binary))
                }
            })?;

        // Feed stdin and drain stdout on their own threads so neither pipe can
        // fill up and stall the child before the time limit is checked.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&input))
        });
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buffer = String::new();
                stdout.read_to_string(&mut buffer).map(|_| buffer)
            })
        });

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                log::warn!("{} {args:?} timed out after {timeout:?}", self.binary);
                return Err(NotebookError::ToolTimedOut(format!(
                    "{} did not answer within {} seconds",
                    self.binary,
                    timeout.as_secs()
                )));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };

        if !status.success() {
            log::warn!("{} {args:?} exited with {status}", self.binary);
            return Err(NotebookError::ToolUnavailable(format!(
                "{} exited with {status}",
                self.binary
            )));
        }

        if let Some(Ok(Err(e))) = writer.map(thread::JoinHandle::join) {
            // The checker may stop reading once it has seen enough input.
            log::debug!("{} closed its input early: {e}", self.binary);
        }

        match reader {
            Some(handle) => handle
                .join()
                .map_err(|_| {
                    NotebookError::ToolUnavailable(format!("reading {} output failed", self.binary))
                })?
                .map_err(NotebookError::from),
            None => Ok(String::new()),
        }
    }
}

/// One word per non-empty line, as printed by `aspell list`.
#[must_use]
pub fn parse_word_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds each reported word in `text`, in report order.
///
/// The checker reports words in the order they occur, so each search starts
/// after the previous hit; repeated misspellings get their own offsets. A word
/// that cannot be found after the cursor falls back to its first occurrence.
#[must_use]
pub fn locate_words(text: &str, words: &[String]) -> Vec<(String, usize)> {
    let mut cursor = 0;
    let mut found: Vec<(String, usize)> = Vec::new();
    for word in words {
        let position = text[cursor..]
            .find(word.as_str())
            .map(|offset| cursor + offset)
            .or_else(|| text.find(word.as_str()));
        if let Some(position) = position {
            cursor = position + word.len();
            found.push((word.clone(), position));
        }
    }
    found.sort_by_key(|(_, position)| *position);
    found.dedup();
    found
}

/// Suggestions from `aspell -a` output, capped at `limit`.
///
/// Only `&` lines carry suggestions:
/// `& word count offset: first, second, ...`.
#[must_use]
pub fn parse_suggestions(output: &str, limit: usize) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.starts_with('&'))
        .filter_map(|line| line.split_once(':'))
        .flat_map(|(_, list)| list.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}
