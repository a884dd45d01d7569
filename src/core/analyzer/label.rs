use std::fmt;
use std::path::PathBuf;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CallscopeError, Result};
use super::types::{CallEdge, FunctionEntry};

/// `name (path:start-end)` with `?` standing in for unknown lines.
///
/// This format is a published contract: external consumers parse it, so
/// the encoder and [`Label::decode`] must stay in lockstep. The
/// parenthesized suffix is never omitted, even for imported leaves whose
/// lines are unknown.
const LABEL_PATTERN: &str = r"^([A-Za-z_][A-Za-z0-9_]*) \((.+):(\d+|\?)-(\d+|\?)\)$";

/// A call-tree node identity: function name plus qualified location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub file: PathBuf,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

impl Label {
    pub(crate) fn from_entry(name: &str, entry: &FunctionEntry) -> Self {
        Self {
            name: name.to_string(),
            file: entry.file.clone(),
            start_line: Some(entry.start_line),
            end_line: Some(entry.end_line),
        }
    }

    pub(crate) fn from_edge(edge: &CallEdge) -> Self {
        Self {
            name: edge.name.clone(),
            file: edge.file.clone(),
            start_line: edge.start_line,
            end_line: edge.end_line,
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{} ({}:{}-{})",
            self.name,
            self.file.display(),
            encode_line(self.start_line),
            encode_line(self.end_line),
        )
    }

    /// Invert [`Label::encode`]. Fails on anything the encoder could not
    /// have produced.
    pub fn decode(text: &str) -> Result<Self> {
        let pattern = Regex::new(LABEL_PATTERN)
            .map_err(|e| CallscopeError::Label(e.to_string()))?;
        let captures = pattern
            .captures(text)
            .ok_or_else(|| CallscopeError::Label(format!("Malformed label: {}", text)))?;

        Ok(Self {
            name: captures[1].to_string(),
            file: PathBuf::from(&captures[2]),
            start_line: decode_line(&captures[3])?,
            end_line: decode_line(&captures[4])?,
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

fn encode_line(line: Option<usize>) -> String {
    match line {
        Some(n) => n.to_string(),
        None => "?".to_string(),
    }
}

fn decode_line(text: &str) -> Result<Option<usize>> {
    if text == "?" {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| CallscopeError::Label(format!("Invalid line number: {}", text)))
}
