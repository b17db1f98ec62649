use super::Record;

/// Writes records to an output destination.
pub trait Recorder {
    /// Writes a record immediately.
    fn write(&mut self, record: Record);

    /// Stores a record for aggregation at the next [`Recorder::flush`].
    fn store(&mut self, record: Record) {
        self.write(record);
    }

    /// Writes values aggregated from the stored records.
    fn flush(&mut self, _step: i64) {}
}
