//! Incremental decoding of a top-level JSON array into records.
//!
//! [`ArrayDecoder`] is a push scanner: it is fed byte chunks of any size and
//! emits every array element that is complete so far. Only the element
//! currently being scanned is buffered, so memory is bounded by the largest
//! single record rather than by the whole file. The scanner only finds
//! element boundaries (bracket depth, string and escape state); each element
//! is then validated and materialized by `serde_json`.
//!
//! [`RecordStream`] wraps a [`ByteStream`] and exposes the decoder as a pull
//! interface: "give me the next record or end-of-stream".

use std::collections::VecDeque;

use futures_util::StreamExt;
use serde_json::Value;

use crate::domain::Record;
use crate::error::{ParseError, Result};
use crate::port::ByteStream;

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// Object or array: ends when bracket depth returns to zero.
    Container,
    /// String: ends at the closing quote.
    String,
    /// Number or literal: ends at the next delimiter.
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Before the opening `[`.
    Start,
    /// After `[` or `,`, waiting for an element.
    BeforeValue { first: bool },
    InValue(ValueKind),
    /// After an element, waiting for `,` or `]`.
    AfterValue,
    /// After the closing `]`. Only whitespace may follow.
    Done,
    Failed(ParseError),
}

/// Push-style scanner for a single JSON array of values.
#[derive(Debug)]
pub struct ArrayDecoder {
    /// Unconsumed bytes. `buf[0]` sits at absolute offset `base`.
    buf: Vec<u8>,
    base: u64,
    pos: usize,
    state: State,
    value_start: usize,
    depth: u32,
    in_string: bool,
    escaped: bool,
    seen_input: bool,
}

impl Default for ArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            base: 0,
            pos: 0,
            state: State::Start,
            value_start: 0,
            depth: 0,
            in_string: false,
            escaped: false,
            seen_input: false,
        }
    }

    /// Push one chunk, appending every element completed by it to `out`.
    ///
    /// Elements completed before a syntax error are still appended. After an
    /// error the decoder is poisoned and every later call returns the same
    /// error.
    ///
    /// # Errors
    /// Returns [`ParseError`] when the input stops being a valid JSON array.
    pub fn feed(
        &mut self,
        chunk: &[u8],
        out: &mut Vec<Record>,
    ) -> std::result::Result<(), ParseError> {
        if let State::Failed(err) = &self.state {
            return Err(err.clone());
        }
        if !chunk.is_empty() {
            self.seen_input = true;
        }
        self.buf.extend_from_slice(chunk);

        let result = self.scan(out);
        if let Err(err) = &result {
            self.state = State::Failed(err.clone());
        }
        self.compact();
        result
    }

    /// Signal end-of-stream.
    ///
    /// # Errors
    /// Returns [`ParseError`] if the array was never opened or not closed.
    pub fn finish(&mut self) -> std::result::Result<(), ParseError> {
        let err = match &self.state {
            State::Done => return Ok(()),
            State::Failed(err) => return Err(err.clone()),
            State::Start if !self.seen_input => ParseError::new(0, "empty input"),
            _ => ParseError::new(
                self.base + self.buf.len() as u64,
                "unexpected end of input",
            ),
        };
        self.state = State::Failed(err.clone());
        Err(err)
    }

    /// True once the closing `]` has been seen.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn offset(&self, at: usize) -> u64 {
        self.base + at as u64
    }

    fn error(&self, at: usize, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.offset(at), reason)
    }

    fn scan(&mut self, out: &mut Vec<Record>) -> std::result::Result<(), ParseError> {
        while self.pos < self.buf.len() {
            let b = self.buf[self.pos];
            match self.state {
                State::Start => {
                    if b == BOM[0] && self.offset(self.pos) == 0 {
                        let available = self.buf.len() - self.pos;
                        if available < BOM.len() {
                            // wait for the rest of the mark
                            return Ok(());
                        }
                        if self.buf[self.pos..self.pos + BOM.len()] != BOM {
                            return Err(self.error(self.pos, "expected '[' at start of input"));
                        }
                        self.pos += BOM.len();
                        continue;
                    }
                    if is_whitespace(b) {
                        self.pos += 1;
                    } else if b == b'[' {
                        self.pos += 1;
                        self.state = State::BeforeValue { first: true };
                    } else {
                        return Err(self.error(self.pos, "expected '[' at start of input"));
                    }
                }
                State::BeforeValue { first } => match b {
                    _ if is_whitespace(b) => self.pos += 1,
                    b']' if first => {
                        self.pos += 1;
                        self.state = State::Done;
                    }
                    b']' => return Err(self.error(self.pos, "trailing comma before ']'")),
                    b',' => return Err(self.error(self.pos, "expected value, found ','")),
                    _ => self.begin_value(b),
                },
                State::InValue(kind) => {
                    if let Some(end) = self.advance_value(kind, b) {
                        out.push(self.take_value(end)?);
                        self.pos = end;
                        self.state = State::AfterValue;
                    }
                }
                State::AfterValue => match b {
                    _ if is_whitespace(b) => self.pos += 1,
                    b',' => {
                        self.pos += 1;
                        self.state = State::BeforeValue { first: false };
                    }
                    b']' => {
                        self.pos += 1;
                        self.state = State::Done;
                    }
                    _ => return Err(self.error(self.pos, "expected ',' or ']' after value")),
                },
                State::Done => {
                    if is_whitespace(b) {
                        self.pos += 1;
                    } else {
                        return Err(self.error(self.pos, "unexpected data after end of array"));
                    }
                }
                State::Failed(ref err) => return Err(err.clone()),
            }
        }
        Ok(())
    }

    fn begin_value(&mut self, first_byte: u8) {
        self.value_start = self.pos;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        let kind = match first_byte {
            b'{' | b'[' => {
                self.depth = 1;
                ValueKind::Container
            }
            b'"' => {
                self.in_string = true;
                ValueKind::String
            }
            _ => ValueKind::Scalar,
        };
        self.pos += 1;
        self.state = State::InValue(kind);
    }

    /// Consume byte `b` of the current value. Returns the exclusive end of
    /// the value once it is complete.
    fn advance_value(&mut self, kind: ValueKind, b: u8) -> Option<usize> {
        if kind == ValueKind::Scalar {
            if is_whitespace(b) || b == b',' || b == b']' {
                // delimiter belongs to the array, not the value
                return Some(self.pos);
            }
            self.pos += 1;
            return None;
        }

        self.pos += 1;
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
                if kind == ValueKind::String {
                    return Some(self.pos);
                }
            }
            return None;
        }

        match b {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => {
                self.depth -= 1;
                if self.depth == 0 {
                    return Some(self.pos);
                }
            }
            _ => {}
        }
        None
    }

    fn take_value(&self, end: usize) -> std::result::Result<Record, ParseError> {
        let bytes = &self.buf[self.value_start..end];
        serde_json::from_slice::<Value>(bytes)
            .map(Record::new)
            .map_err(|e| self.error(self.value_start, format!("invalid array element: {e}")))
    }

    /// Drop bytes no longer needed: everything before the current value, or
    /// everything scanned when between values.
    fn compact(&mut self) {
        let keep_from = match self.state {
            State::InValue(_) => self.value_start,
            _ => self.pos,
        };
        if keep_from == 0 {
            return;
        }
        self.buf.drain(..keep_from);
        self.base += keep_from as u64;
        self.pos -= keep_from;
        self.value_start = self.value_start.saturating_sub(keep_from);
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Pull interface over a byte stream.
///
/// Single pass: once it returns `None` or an error it stays exhausted.
pub struct RecordStream {
    bytes: ByteStream,
    decoder: ArrayDecoder,
    ready: VecDeque<Record>,
    pending_error: Option<crate::error::Error>,
    exhausted: bool,
    bytes_read: u64,
}

impl RecordStream {
    pub fn new(bytes: ByteStream) -> Self {
        Self {
            bytes,
            decoder: ArrayDecoder::new(),
            ready: VecDeque::new(),
            pending_error: None,
            exhausted: false,
            bytes_read: 0,
        }
    }

    /// Total bytes pulled from the underlying stream so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Next record, `None` at a clean end-of-stream, or the error that ended
    /// the stream. Records decoded before an error are yielded first.
    pub async fn next_record(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.pending_error.take() {
                return Some(Err(err));
            }
            if self.exhausted {
                return None;
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    self.bytes_read += chunk.len() as u64;
                    let mut out = Vec::new();
                    let fed = self.decoder.feed(&chunk, &mut out);
                    self.ready.extend(out);
                    if let Err(err) = fed {
                        self.exhausted = true;
                        self.pending_error = Some(err.into());
                    }
                }
                Some(Err(err)) => {
                    self.exhausted = true;
                    self.pending_error = Some(err);
                }
                None => {
                    self.exhausted = true;
                    if let Err(err) = self.decoder.finish() {
                        self.pending_error = Some(err.into());
                    }
                }
            }
        }
    }
}
