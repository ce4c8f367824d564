//! Record framing
//!
//! The feed is newline-delimited. [`RecordBuffer`] holds decoded but
//! not-yet-parsed text and drains complete records from the front, leaving
//! a trailing partial record buffered for the next read. Only records
//! carrying the `data:` prefix are data-bearing; everything else is
//! framing noise.

/// Literal prefix marking a data-bearing record.
pub const DATA_PREFIX: &str = "data:";

/// Growable buffer of decoded, unparsed feed text.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buf: String,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly decoded text.
    pub fn push(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Drain the next complete newline-terminated record, without its
    /// terminator. Returns `None` while only a partial record remains.
    pub fn next_record(&mut self) -> Option<String> {
        let newline = self.buf.find('\n')?;
        let mut record: String = self.buf.drain(..=newline).collect();
        record.pop();
        if record.ends_with('\r') {
            record.pop();
        }
        Some(record)
    }

    /// Take whatever is left at end-of-stream. A server that omits the
    /// final newline still gets its last record parsed.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.buf))
    }
}

/// Extract the payload of a data-bearing record.
///
/// Returns `None` for framing noise (records without the `data:` prefix),
/// which the pipeline discards silently. One space after the colon is
/// tolerated, matching the server's framing.
pub fn record_payload(record: &str) -> Option<&str> {
    let rest = record.strip_prefix(DATA_PREFIX)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
