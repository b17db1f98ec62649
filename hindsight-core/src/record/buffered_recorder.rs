use super::{Record, Recorder};

/// Keeps every written or stored record in memory.
///
/// Used for inspecting training runs in tests.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    flushed_steps: Vec<i64>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Records holding `key`.
    pub fn with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.buf.iter().filter(move |r| r.get(key).is_some())
    }

    /// Steps passed to [`Recorder::flush`], in call order.
    pub fn flushed_steps(&self) -> &[i64] {
        &self.flushed_steps
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn flush(&mut self, step: i64) {
        self.flushed_steps.push(step);
    }
}
