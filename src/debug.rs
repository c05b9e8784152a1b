use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of one engine's generations: page-break decisions, asset
/// outcomes and a counter summary per generation.
#[derive(Clone)]
pub struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    /// Writes `{"type": kind, ...fields}` as one line.
    pub fn log_event(&self, kind: &str, fields: Value) {
        let mut record = serde_json::Map::new();
        record.insert("type".to_string(), Value::String(kind.to_string()));
        if let Value::Object(fields) = fields {
            record.extend(fields);
        }
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{}", Value::Object(record));
        }
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Writes the accumulated counters and resets them.
    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let counters = std::mem::take(&mut state.counters);
            let line = json!({
                "type": "debug.summary",
                "context": context,
                "counts": counters,
            });
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_log_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("roastdeck_{tag}_{}_{}.jsonl", std::process::id(), nanos))
    }

    #[test]
    fn writes_events_and_summary_as_json_lines() {
        let path = temp_log_path("debug");
        let logger = DebugLogger::new(&path).expect("logger");
        logger.log_event("flow.break", json!({"section": "acts", "before": 3}));
        logger.increment("pages", 2);
        logger.increment("pages", 1);
        logger.emit_summary("roast \"deck\"");
        logger.flush();

        let text = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "flow.break");
        assert_eq!(lines[0]["before"], 3);
        assert_eq!(lines[1]["context"], "roast \"deck\"");
        assert_eq!(lines[1]["counts"]["pages"], 3);
        let _ = std::fs::remove_file(&path);
    }
}
