//! Incremental line framing for streamed response bodies.
//!
//! Servers flush at arbitrary byte offsets, so a chunk may end inside a
//! multi-byte character or halfway through a line. [`LineFramer`] carries both
//! kinds of leftovers between chunks and only ever hands out complete lines.

/// Lines carrying payload start with this prefix; everything after it is content.
pub const DATA_PREFIX: &str = "data:";

/// The payload of a `data:` line, or `None` for any other line.
///
/// Other lines (`event:`, `id:`, comments, blank separators) carry nothing to
/// display and are dropped.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// UTF-8 decoder that keeps an incomplete trailing sequence for the next call.
/// Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[start..valid_end]).unwrap_or_default());
                    match e.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    /// Ends the stream. A dangling partial sequence becomes one U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push(char::REPLACEMENT_CHARACTER);
            self.pending.clear();
        }
    }
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// Only `\n` is a delimiter; a `\r` before it stays part of the line.
#[derive(Debug, Default)]
pub struct LineFramer {
    decoder: Utf8StreamDecoder,
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the lines it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> CompleteLines {
        self.decoder.decode(chunk, &mut self.buffer);
        let complete = match self.buffer.rfind('\n') {
            Some(last_newline) => {
                let remainder = self.buffer.split_off(last_newline + 1);
                std::mem::replace(&mut self.buffer, remainder)
            }
            None => String::new(),
        };
        CompleteLines { text: complete, position: 0 }
    }

    /// Ends the stream and returns the unterminated last line, if any.
    pub fn flush(&mut self) -> Option<String> {
        self.decoder.finish(&mut self.buffer);
        let remainder = std::mem::take(&mut self.buffer);
        (!remainder.is_empty()).then_some(remainder)
    }
}

/// Lazy iterator over the lines completed by one [`LineFramer::feed`] call.
#[derive(Debug)]
pub struct CompleteLines {
    text: String,
    position: usize,
}

impl Iterator for CompleteLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let rest = &self.text[self.position..];
        let end = rest.find('\n')?;
        let line = rest[..end].to_string();
        self.position += end + 1;
        Some(line)
    }
}
