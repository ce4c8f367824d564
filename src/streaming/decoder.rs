//! Incremental UTF-8 decoding
//!
//! HTTP chunk boundaries fall anywhere, including inside a multi-byte
//! scalar. [`Utf8StreamDecoder`] carries the undecoded trailing bytes of
//! each chunk over to the next one, so decoding chunk-by-chunk is
//! equivalent to decoding the whole concatenated body at once.

/// Stateful streaming UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Bytes of an incomplete trailing scalar, kept until the next chunk.
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    ///
    /// Invalid sequences become U+FFFD; an incomplete trailing sequence is
    /// retained for the next call rather than decoded in isolation.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            // Incomplete trailing scalar; wait for more bytes.
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Drain any buffered bytes at end-of-stream.
    ///
    /// A retained incomplete sequence can no longer be completed, so it
    /// decodes to U+FFFD.
    pub fn flush(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }

    /// Whether bytes are currently buffered awaiting completion.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn multibyte_scalar_split_across_chunks() {
        // U+00E9 is 0xC3 0xA9
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"caf\xC3"), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(b"\xA9!"), "\u{e9}!");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn four_byte_scalar_split_three_ways() {
        // U+1F600 is 0xF0 0x9F 0x98 0x80
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"\xF0"), "");
        assert_eq!(decoder.decode(b"\x9F\x98"), "");
        assert_eq!(decoder.decode(b"\x80"), "\u{1F600}");
    }

    #[test]
    fn chunking_is_equivalent_to_whole_input() {
        let input = "도쿄 🗼 tower, naïve résumé".as_bytes();
        let whole = String::from_utf8(input.to_vec()).unwrap();

        // Every split point, pairwise
        for split in 0..=input.len() {
            let mut decoder = Utf8StreamDecoder::new();
            let mut out = decoder.decode(&input[..split]);
            out.push_str(&decoder.decode(&input[split..]));
            out.push_str(&decoder.flush());
            assert_eq!(out, whole, "split at {split}");
        }

        // One byte at a time
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for b in input {
            out.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        out.push_str(&decoder.flush());
        assert_eq!(out, whole);
    }

    #[test]
    fn invalid_sequence_becomes_replacement_char() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn flush_replaces_dangling_partial() {
        let mut decoder = Utf8StreamDecoder::new();
        decoder.decode(b"\xC3");
        assert_eq!(decoder.flush(), "\u{FFFD}");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.flush(), "");
    }
}
