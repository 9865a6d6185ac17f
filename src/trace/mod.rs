//! Trace input: the event log written by the external compiler.
//!
//! Two encodings are accepted:
//! - a JSON array of records (the form scenes ship as data files)
//! - the compiler's raw stderr log, one `ANIM: {...}` record per line; other lines are
//!   ignored so a log with interleaved diagnostics still loads
//!
//! Every record is tagged by its `$` field.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::regex::RegexProps;

const LOG_PREFIX: &str = "ANIM:";

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid trace JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid trace record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("trace contains no {0} events")]
    Missing(&'static str),
}

/// A token accepted by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub text: String,
}

/// One trace record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$")]
pub enum Notify {
    RegexCompile {
        pattern: String,
        regex: RegexProps,
    },
    RegexAccept {
        accept: RegexProps,
    },
    RegexUnion {
        union: String,
        #[serde(alias = "left")]
        lhs: String,
        #[serde(alias = "right")]
        rhs: String,
    },
    LexiconAddToken {
        id: i64,
        name: String,
    },
    LexiconAddState {
        id: u32,
        #[serde(default)]
        poses: Vec<String>,
    },
    LexiconAddTransfer {
        from: u32,
        to: u32,
        input: u32,
    },
    LexiconSetAccept {
        id: u32,
        token: i64,
    },
    ScannerSetSource {
        source: String,
    },
    ScannerSetState {
        state: i64,
    },
    ScannerNextInput,
    ScannerNextLine,
    ScannerAcceptToken {
        token: Token,
    },
}

impl Notify {
    /// The record's `$` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Notify::RegexCompile { .. } => "RegexCompile",
            Notify::RegexAccept { .. } => "RegexAccept",
            Notify::RegexUnion { .. } => "RegexUnion",
            Notify::LexiconAddToken { .. } => "LexiconAddToken",
            Notify::LexiconAddState { .. } => "LexiconAddState",
            Notify::LexiconAddTransfer { .. } => "LexiconAddTransfer",
            Notify::LexiconSetAccept { .. } => "LexiconSetAccept",
            Notify::ScannerSetSource { .. } => "ScannerSetSource",
            Notify::ScannerSetState { .. } => "ScannerSetState",
            Notify::ScannerNextInput => "ScannerNextInput",
            Notify::ScannerNextLine => "ScannerNextLine",
            Notify::ScannerAcceptToken { .. } => "ScannerAcceptToken",
        }
    }
}

/// A loaded trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub events: Vec<Notify>,
}

impl Trace {
    /// Parse either encoding (see module docs).
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            let events: Vec<Notify> = serde_json::from_str(trimmed)?;
            return Ok(Self { events });
        }

        let mut events = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            let record = match line.strip_prefix(LOG_PREFIX) {
                Some(rest) => rest.trim_start(),
                None if line.starts_with('{') => line,
                None => continue,
            };
            let notify = serde_json::from_str(record)
                .map_err(|source| TraceError::Record { line: i + 1, source })?;
            events.push(notify);
        }
        Ok(Self { events })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let trace = Self::parse(&text)?;
        log::info!("trace: loaded {} events from {}", trace.events.len(), path.display());
        Ok(trace)
    }

    /// `(pattern, tree)` of every compiled regex, in trace order.
    pub fn compiled_regexes(&self) -> impl Iterator<Item = (&str, &RegexProps)> {
        self.events.iter().filter_map(|n| match n {
            Notify::RegexCompile { pattern, regex } => Some((pattern.as_str(), regex)),
            _ => None,
        })
    }

    /// Scanner state sequence (negative states are dropped).
    pub fn scanner_states(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|n| match n {
                Notify::ScannerSetState { state } => u32::try_from(*state).ok(),
                _ => None,
            })
            .collect()
    }

    /// Tokens accepted by the scanner, in order.
    pub fn accepted_tokens(&self) -> impl Iterator<Item = &Token> {
        self.events.iter().filter_map(|n| match n {
            Notify::ScannerAcceptToken { token } => Some(token),
            _ => None,
        })
    }

    /// Event counts per kind.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for n in &self.events {
            *counts.entry(n.kind()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let trace = Trace::parse(
            r#"[
                {"$": "LexiconAddToken", "id": 1, "name": "ID"},
                {"$": "ScannerNextInput"},
                {"$": "RegexUnion", "union": "u", "left": "a", "right": "b"}
            ]"#,
        )
        .unwrap();

        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.events[1], Notify::ScannerNextInput);
        assert_eq!(
            trace.events[2],
            Notify::RegexUnion {
                union: "u".into(),
                lhs: "a".into(),
                rhs: "b".into()
            }
        );
    }

    #[test]
    fn parses_raw_compiler_log() {
        let log = "building lexicon\n\
                   ANIM: {\"$\":\"ScannerSetState\",\"state\":3}\n\
                   ANIM: {\"$\":\"ScannerSetState\",\"state\":-1}\n\
                   ANIM: {\"$\":\"ScannerNextLine\"}\n";
        let trace = Trace::parse(log).unwrap();

        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.scanner_states(), vec![3]);
        assert_eq!(trace.summary().get("ScannerSetState"), Some(&2));
    }

    #[test]
    fn reports_bad_line() {
        let err = Trace::parse("ANIM: {\"$\":\"ScannerSetState\"}\n").unwrap_err();
        assert!(matches!(err, TraceError::Record { line: 1, .. }));
    }

    #[test]
    fn parses_accepted_token() {
        let trace = Trace::parse(
            r#"[{"$":"ScannerAcceptToken","token":{"id":2,"name":"NUMBER","offset":8,
                "length":2,"start_line":1,"start_column":9,"end_line":1,"end_column":11,
                "text":"10"}}]"#,
        )
        .unwrap();
        let token = trace.accepted_tokens().next().unwrap();
        assert_eq!(token.name, "NUMBER");
        assert_eq!(token.text, "10");
    }
}
