// File: src/errors.rs
//
// Error handling and reporting for the Soutk programming language.
// Provides structured error types with source location information
// and pretty-printed error messages.

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub line: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize) -> Self {
        Self { line, file: None }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}", file, self.line)
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

/// The three failure classes in Soutk.
///
/// Lex and parse errors are fatal for the file being processed; runtime
/// errors can be intercepted by a `ward`/`rescue` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "Lex Error"),
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

/// A structured error with location information
#[derive(Debug, Clone)]
pub struct SoutkError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    pub suggestion: Option<String>,
}

impl SoutkError {
    pub fn new(kind: ErrorKind, message: String, location: SourceLocation) -> Self {
        Self { kind, message, location, suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Create a lex error
    pub fn lex_error(message: String, line: usize) -> Self {
        Self::new(ErrorKind::LexError, message, SourceLocation::new(line))
    }

    /// Create a parse error
    pub fn parse_error(message: String, line: usize) -> Self {
        Self::new(ErrorKind::ParseError, message, SourceLocation::new(line))
    }

    /// Create a runtime error
    pub fn runtime_error(message: String, line: usize) -> Self {
        Self::new(ErrorKind::RuntimeError, message, SourceLocation::new(line))
    }

    /// True when a `ward`/`rescue` block may intercept this error.
    pub fn is_recoverable(&self) -> bool {
        self.kind == ErrorKind::RuntimeError
    }
}

impl fmt::Display for SoutkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        let location_str = format!("  --> {}", self.location);
        writeln!(f, "{}", location_str.bright_blue())?;

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for SoutkError {}

/// Levenshtein edit distance: the minimum number of single-character
/// insertions, deletions, or substitutions turning one string into the other.
/// Two-row rolling computation rather than the full matrix.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b.chars().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

/// How far a candidate may drift from the target and still count as a
/// plausible typo. Short names tolerate less.
fn suggestion_threshold(name_len: usize) -> usize {
    match name_len {
        0 => 0,
        1..=2 => 1,
        3..=5 => 2,
        _ => 3,
    }
}

/// Find the closest match among the candidates for a "Did you mean?" hint.
/// Returns None when nothing is within the typo threshold.
pub fn find_closest_match<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = suggestion_threshold(target.chars().count());
    let mut best: Option<(&str, usize)> = None;

    for candidate in candidates {
        // A large length difference already exceeds the threshold
        if target.len().abs_diff(candidate.len()) > threshold {
            continue;
        }
        let distance = edit_distance(target, candidate);
        if distance <= threshold && best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(candidate, _)| candidate)
}
