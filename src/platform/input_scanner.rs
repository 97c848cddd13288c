//! Incremental escape-sequence scanner for terminal input.
//!
//! Reads arrive in arbitrary chunks: an SGR mouse report or a multi-byte UTF-8
//! character can be split across two reads. The scanner holds incomplete tails
//! and emits only whole sequences, so a partial report never reaches key
//! consumers as plain text. A tail that never completes is emitted verbatim once
//! the timeout passes.

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
    NotEscape,
}

#[derive(Debug, Default)]
struct SequenceSplit {
    sequences: Vec<String>,
    remainder: String,
}

/// Splits raw input into complete key/mouse sequences.
#[derive(Debug)]
pub struct InputScanner {
    buffer: String,
    utf8_tail: Vec<u8>,
    timeout_ms: u64,
    flush_deadline: Option<Instant>,
}

impl InputScanner {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            buffer: String::new(),
            utf8_tail: Vec::new(),
            timeout_ms,
            flush_deadline: None,
        }
    }

    /// Feed one read's worth of bytes.
    pub fn process(&mut self, data: &[u8]) -> Vec<String> {
        self.flush_deadline = None;

        // Legacy 8-bit meta: a lone high byte means ESC + (byte - 128).
        if self.utf8_tail.is_empty() && data.len() == 1 && data[0] > 127 && !is_utf8_lead(data[0]) {
            let mut converted = String::from("\x1b");
            converted.push((data[0] - 128) as char);
            return self.process_str(&converted);
        }

        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(data);
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                // Truncated multi-byte character at the end: keep it for the next read.
                let valid = err.valid_up_to();
                self.utf8_tail = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        let events = self.process_str(&text);
        if !self.utf8_tail.is_empty() && self.flush_deadline.is_none() {
            self.flush_deadline = Some(Instant::now() + Duration::from_millis(self.timeout_ms));
        }
        events
    }

    /// Emit the held tail if its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        if self.buffer.is_empty() && self.utf8_tail.is_empty() {
            self.flush_deadline = None;
            return Vec::new();
        }

        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Poll timeout that wakes the reader in time for the next `flush_due`.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        if let Some(deadline) = self.flush_deadline {
            let remaining = deadline.saturating_duration_since(now);
            let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
            return ms.min(default_ms).max(0);
        }
        default_ms
    }

    /// Emit whatever is held, verbatim.
    pub fn flush(&mut self) -> Vec<String> {
        self.flush_deadline = None;
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.buffer)]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.buffer.clear();
        self.utf8_tail.clear();
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn process_str(&mut self, data: &str) -> Vec<String> {
        self.buffer.push_str(data);
        let split = extract_complete_sequences(&self.buffer);
        // Incomplete tails stay buffered until timeout so bytes are never dropped
        // or reordered.
        self.buffer = split.remainder;
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(Instant::now() + Duration::from_millis(self.timeout_ms));
        }
        split.sequences
    }
}

fn is_utf8_lead(byte: u8) -> bool {
    (0xc2..=0xf4).contains(&byte)
}

fn extract_complete_sequences(buffer: &str) -> SequenceSplit {
    let mut sequences = Vec::new();
    let bytes = buffer.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != ESC {
            let Some(ch) = buffer[pos..].chars().next() else {
                break;
            };
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }

        let mut seq_end = pos + 1;
        let mut completed = false;
        while seq_end <= bytes.len() {
            if !buffer.is_char_boundary(seq_end) {
                seq_end += 1;
                continue;
            }
            let candidate = &buffer[pos..seq_end];
            match sequence_status(candidate) {
                SequenceStatus::Complete | SequenceStatus::NotEscape => {
                    sequences.push(candidate.to_string());
                    pos = seq_end;
                    completed = true;
                    break;
                }
                SequenceStatus::Incomplete => seq_end += 1,
            }
        }

        if !completed {
            return SequenceSplit {
                sequences,
                remainder: buffer[pos..].to_string(),
            };
        }
    }

    SequenceSplit {
        sequences,
        remainder: String::new(),
    }
}

fn sequence_status(data: &str) -> SequenceStatus {
    if !data.starts_with('\x1b') {
        return SequenceStatus::NotEscape;
    }
    if data.len() == 1 {
        return SequenceStatus::Incomplete;
    }

    let after = &data[1..];
    if after.starts_with('[') {
        if after.starts_with("[M") {
            // X10 mouse: ESC [ M + three raw bytes.
            return if data.chars().count() >= 6 {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            };
        }
        return csi_status(data);
    }
    if after.starts_with(']') {
        return string_terminated_status(data, true);
    }
    if after.starts_with('P') || after.starts_with('_') {
        return string_terminated_status(data, false);
    }
    if after.starts_with('O') {
        return if after.len() >= 2 {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }

    // ESC + one character (meta-modified key).
    SequenceStatus::Complete
}

fn csi_status(data: &str) -> SequenceStatus {
    if data.len() < 3 {
        return SequenceStatus::Incomplete;
    }

    let payload = &data[2..];
    let Some(last_byte) = payload.as_bytes().last().copied() else {
        return SequenceStatus::Incomplete;
    };
    // The first final byte ends any CSI, SGR mouse reports included; a
    // malformed report is rejected later by the mouse parser.
    if (0x40..=0x7e).contains(&last_byte) {
        SequenceStatus::Complete
    } else {
        SequenceStatus::Incomplete
    }
}

fn string_terminated_status(data: &str, allow_bel: bool) -> SequenceStatus {
    if data.ends_with("\x1b\\") || (allow_bel && data.ends_with('\x07')) {
        SequenceStatus::Complete
    } else {
        SequenceStatus::Incomplete
    }
}
