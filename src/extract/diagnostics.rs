//! Diagnostic reporting for row extraction.
//!
//! Nothing in [`crate::extract`] ever returns an error for bad user input.
//! Compile, parse, and evaluation failures are described in a human-readable
//! message handed to a [`Reporter`] and the affected cells come back empty.

use std::sync::{Mutex, PoisonError};

use crate::error::ParseError;
use crate::xpath::XPathError;

/// Longest XML value, in characters, quoted in a parse failure message.
pub const MAX_QUOTED_XML_CHARS: usize = 512;

/// A sink for extraction diagnostics.
///
/// Implementations must be shareable between the threads evaluating rows.
pub trait Reporter: Send + Sync {
    /// Publishes one diagnostic message.
    fn report(&self, message: &str);
}

/// Reports through `tracing` at warn level on target
/// `xmlselect::diagnostics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::warn!(target: "xmlselect::diagnostics", "{message}");
    }
}

/// Keeps every message in memory, in the order reported.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the messages reported so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Removes and returns the messages reported so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still guards a consistent Vec.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _message: &str) {}
}

pub(crate) fn compile_failure(expression: &str, error: &XPathError) -> String {
    format!("Error occurred compiling XPath expression: \"{expression}\".\n{error}")
}

/// `error` is `None` when there was no value to parse at all.
pub(crate) fn parse_failure(xml: Option<&str>, error: Option<&ParseError>) -> String {
    let mut message = String::from("Error occurred parsing string as xml document:\n");
    match xml {
        None => message.push_str("<null>"),
        Some(xml) => match xml.char_indices().nth(MAX_QUOTED_XML_CHARS) {
            Some((cut, _)) => {
                message.push_str(&xml[..cut]);
                message.push('…');
            }
            None => message.push_str(xml),
        },
    }
    if let Some(error) = error {
        message.push('\n');
        message.push_str(&error.to_string());
    }
    message
}

pub(crate) fn evaluation_failure(expression: &str, error: &XPathError) -> String {
    format!("Error occurred applying XPath expression: \"{expression}\" to xml.\n{error}")
}
