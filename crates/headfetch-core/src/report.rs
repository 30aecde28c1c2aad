//! Where digest records go once computed.

use crate::digest::DigestRecord;

/// Receives one formatted digest record at a time.
pub trait DigestSink {
    fn emit(&mut self, record: &DigestRecord);
}

/// Emits each record as an `info` event on the process-wide tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DigestSink for TracingSink {
    fn emit(&mut self, record: &DigestRecord) {
        tracing::info!("{}", record);
    }
}

/// Collects formatted lines; used by tests and callers that print themselves.
impl DigestSink for Vec<String> {
    fn emit(&mut self, record: &DigestRecord) {
        self.push(record.to_string());
    }
}

/// Sends every record to `sink`, in order.
pub fn emit_all<S: DigestSink + ?Sized>(records: &[DigestRecord], sink: &mut S) {
    for record in records {
        sink.emit(record);
    }
}
