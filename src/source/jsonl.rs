//! JSON-lines batch source.
//!
//! Each non-blank line is one event: an object keyed by NanoAOD branch
//! name.
//!
//! ```text
//! {"nJet": 2, "Jet_pt": [41.2, 18.0], "Jet_eta": [0.3, -1.1], ..., "PuppiMET_pt": 12.5}
//! ```
//!
//! Branch shapes are inferred per value:
//! - arrays become ragged columns
//! - integers under an `n<Name>` key (no underscore) become counts
//! - every other number or boolean becomes a per-event scalar
//!
//! Batches never span two inputs. Every event of an input must carry the
//! same set of branches.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::model::{Column, EventBatch, Jagged};
use crate::{Error, Result};
use super::{BatchSource, DEFAULT_BATCH_SIZE};

enum Pending {
    Path(PathBuf),
    Reader { label: String, reader: Box<dyn BufRead> },
}

struct Current {
    label: String,
    reader: Box<dyn BufRead>,
    line: usize,
}

/// Reads events from one or more JSON-lines inputs in order.
pub struct JsonLinesSource {
    pending: VecDeque<Pending>,
    current: Option<Current>,
    batch_size: usize,
    buf: String,
}

impl JsonLinesSource {
    /// Files are opened lazily, one at a time, in the given order.
    pub fn open(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self::with_pending(paths.into_iter().map(|p| Pending::Path(p.into())).collect())
    }

    /// Read from an already-open reader.
    pub fn from_reader(label: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        let pending = VecDeque::from([Pending::Reader { label: label.into(), reader: Box::new(reader) }]);
        Self::with_pending(pending)
    }

    fn with_pending(pending: VecDeque<Pending>) -> Self {
        Self { pending, current: None, batch_size: DEFAULT_BATCH_SIZE, buf: String::new() }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Make the next pending input current. `false` when none remain.
    fn advance(&mut self) -> Result<bool> {
        let Some(next) = self.pending.pop_front() else {
            return Ok(false);
        };
        let (label, reader): (String, Box<dyn BufRead>) = match next {
            Pending::Path(path) => {
                let file = File::open(&path)?;
                (path.display().to_string(), Box::new(BufReader::new(file)))
            }
            Pending::Reader { label, reader } => (label, reader),
        };
        info!(input = %label, "reading events");
        self.current = Some(Current { label, reader, line: 0 });
        Ok(true)
    }
}

impl BatchSource for JsonLinesSource {
    fn next_batch(&mut self) -> Result<Option<EventBatch>> {
        loop {
            if self.current.is_none() && !self.advance()? {
                return Ok(None);
            }
            let Some(current) = self.current.as_mut() else {
                return Ok(None);
            };

            let mut batch = EventBatch::default();
            while batch.len() < self.batch_size {
                self.buf.clear();
                if current.reader.read_line(&mut self.buf)? == 0 {
                    break;
                }
                current.line += 1;
                let text = self.buf.trim();
                if text.is_empty() {
                    continue;
                }
                let event = parse_event(text).map_err(|message| Error::Parse {
                    input: current.label.clone(),
                    line: current.line,
                    message,
                })?;
                batch.append(event).map_err(|e| Error::Parse {
                    input: current.label.clone(),
                    line: current.line,
                    message: e.to_string(),
                })?;
            }

            if batch.len() < self.batch_size {
                debug!(input = %current.label, lines = current.line, "input exhausted");
                self.current = None;
            }
            if !batch.is_empty() {
                return Ok(Some(batch));
            }
        }
    }

    fn describe(&self) -> String {
        let inputs = self.pending.len() + usize::from(self.current.is_some());
        format!("jsonl({inputs} inputs, batch size {})", self.batch_size)
    }
}

fn is_count_branch(name: &str) -> bool {
    name.len() > 1 && name.starts_with('n') && !name.contains('_')
}

fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// One JSON object into a single-event batch.
fn parse_event(text: &str) -> std::result::Result<EventBatch, String> {
    let record: Map<String, JsonValue> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let mut batch = EventBatch::new(1);
    for (name, value) in record {
        let column = match &value {
            JsonValue::Array(items) => {
                let row = items
                    .iter()
                    .map(number)
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| format!("branch `{name}` holds a non-numeric element"))?;
                let mut jagged = Jagged::new();
                jagged.push_row(row);
                Column::Jagged(jagged)
            }
            JsonValue::Number(n) if is_count_branch(&name) => match n.as_u64().and_then(|c| u32::try_from(c).ok()) {
                Some(count) => Column::Count(vec![count]),
                None => return Err(format!("count branch `{name}` is not a non-negative integer")),
            },
            other => match number(other) {
                Some(x) => Column::Scalar(vec![x]),
                None => return Err(format!("branch `{name}` has unsupported type")),
            },
        };
        batch.insert(name, column).map_err(|e| e.to_string())?;
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EVENTS: &str = r#"{"nJet": 1, "Jet_pt": [50.0], "PuppiMET_pt": 3.5}
{"nJet": 0, "Jet_pt": [], "PuppiMET_pt": 1}

{"nJet": 2, "Jet_pt": [10.0, 5.0], "PuppiMET_pt": 0.0}
"#;

    fn source(batch_size: usize) -> JsonLinesSource {
        JsonLinesSource::from_reader("mem", Cursor::new(EVENTS.as_bytes().to_vec())).with_batch_size(batch_size)
    }

    #[test]
    fn test_batches_respect_size() {
        let mut src = source(2);
        let first = src.next_batch().unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.counts("nJet").unwrap(), &[1, 0]);
        assert_eq!(first.scalar("PuppiMET_pt", 1).unwrap(), 1.0);
        let second = src.next_batch().unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.jagged("Jet_pt").unwrap().row(0), Some(&[10.0, 5.0][..]));
        assert!(src.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut src = JsonLinesSource::from_reader("bad", Cursor::new(b"{\"nJet\": 1}\n{oops\n".to_vec()));
        let err = src.next_batch().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_inconsistent_branches_rejected() {
        let text = "{\"nJet\": 1}\n{\"nMuon\": 1}\n";
        let mut src = JsonLinesSource::from_reader("mixed", Cursor::new(text.as_bytes().to_vec()));
        assert!(matches!(src.next_batch(), Err(Error::Parse { line: 2, .. })));
    }

    #[test]
    fn test_count_branch_detection() {
        assert!(is_count_branch("nJet"));
        assert!(is_count_branch("nboostedTau"));
        assert!(!is_count_branch("Jet_nMuons"));
        assert!(!is_count_branch("n"));
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(parse_event("{\"nJet\": -1}").is_err());
        assert!(parse_event("{\"Jet_pt\": [\"x\"]}").is_err());
    }
}
