use super::{Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Aggregates stored records and prints them as a table on flush.
///
/// Scalars are printed with four decimals; the table is emitted through
/// [`log::info!`], one line per key.
#[derive(Debug)]
pub struct LogRecorder {
    storage: RecordStorage,
    width: usize,
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self {
            storage: RecordStorage::new(),
            width: 42,
        }
    }
}

impl LogRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimal width of the printed table.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    fn format_value(value: &RecordValue) -> String {
        match value {
            RecordValue::Scalar(v) => format!("{:.4}", v),
            RecordValue::DateTime(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            RecordValue::Array1(v) => format!("[{} values]", v.len()),
            RecordValue::String(s) => s.clone(),
        }
    }

    /// Formats a record as table lines, keys sorted.
    pub fn table(&self, header: Option<&str>, record: &Record) -> Vec<String> {
        let mut rows: Vec<(String, String)> = record
            .iter()
            .map(|(k, v)| (k.clone(), Self::format_value(v)))
            .collect();
        rows.sort();

        let keys_maxlen = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let values_maxlen = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let max_width = self.width.max(keys_maxlen + values_maxlen + 3);
        let rule = "-".repeat(2 + max_width);

        let mut lines = vec![];
        if let Some(header) = header {
            lines.push(header.to_string());
        }
        lines.push(rule.clone());
        for (k, v) in rows.iter() {
            let right = format!("| {:>w$}", v, w = values_maxlen);
            let pad = 2 + max_width - k.len() - right.len();
            lines.push(format!("{}{}{}", k, " ".repeat(pad), right));
        }
        lines.push(rule);
        lines
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        for line in self.table(None, &record) {
            info!("{}", line);
        }
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let record = self.storage.aggregate();
        let header = format!("Step {}", step);
        for line in self.table(Some(&header), &record) {
            info!("{}", line);
        }
    }
}
