//! Log tail reconciliation
//!
//! The telemetry API answers every log fetch with a trailing window that may
//! overlap, or entirely repeat, what was already received. Each fetch is
//! fingerprinted by its last [`TAIL_FINGERPRINT_LEN`] characters; a fetch
//! whose fingerprint matches the previous accepted one is treated as a
//! re-delivery and dropped. Anything else is appended and the display buffer
//! is trimmed from the front to [`MAX_BUFFER`] characters.
//!
//! New output that happens to end in exactly the same characters as the
//! previous fetch is indistinguishable from a re-delivery and is dropped too.
//! Fixing that needs offsets or sequence numbers from the log source.

use serde::Serialize;

/// Maximum characters kept in the display buffer
pub const MAX_BUFFER: usize = 6000;

/// Length of the suffix used to detect re-delivered log windows
pub const TAIL_FINGERPRINT_LEN: usize = 300;

/// Per-subject log display state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogBuffer {
    pub displayed_text: String,
    pub last_tail_fingerprint: Option<String>,
}

/// What a push did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPush {
    /// Empty fetch, nothing changed
    Empty,
    /// Fingerprint matched the previous fetch, nothing changed
    Duplicate,
    /// The chunk was appended; `dropped_chars` were trimmed from the front
    Appended {
        appended_chars: usize,
        dropped_chars: usize,
    },
}

/// Turns overlapping log fetches into one bounded, growing buffer
#[derive(Debug, Clone)]
pub struct LogTailReconciler {
    buffer: LogBuffer,
    /// Character count of `buffer.displayed_text`
    chars: usize,
    max_chars: usize,
    fingerprint_len: usize,
}

impl Default for LogTailReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl LogTailReconciler {
    pub fn new() -> Self {
        Self::with_limits(MAX_BUFFER, TAIL_FINGERPRINT_LEN)
    }

    pub fn with_limits(max_chars: usize, fingerprint_len: usize) -> Self {
        Self {
            buffer: LogBuffer::default(),
            chars: 0,
            max_chars,
            fingerprint_len: fingerprint_len.max(1),
        }
    }

    /// Reconcile one fetch result into the buffer
    pub fn push(&mut self, chunk: &str) -> LogPush {
        if chunk.is_empty() {
            return LogPush::Empty;
        }

        let fingerprint = tail_chars(chunk, self.fingerprint_len);
        if self.buffer.last_tail_fingerprint.as_deref() == Some(fingerprint) {
            return LogPush::Duplicate;
        }

        let appended_chars = chunk.chars().count();
        self.buffer.displayed_text.push_str(chunk);
        self.chars += appended_chars;

        let dropped_chars = self.chars.saturating_sub(self.max_chars);
        if dropped_chars > 0 {
            let cut = byte_offset_of_char(&self.buffer.displayed_text, dropped_chars);
            self.buffer.displayed_text.drain(..cut);
            self.chars -= dropped_chars;
        }

        self.buffer.last_tail_fingerprint = Some(fingerprint.to_string());

        LogPush::Appended {
            appended_chars,
            dropped_chars,
        }
    }

    /// Forget all text and the fingerprint
    pub fn reset(&mut self) {
        self.buffer = LogBuffer::default();
        self.chars = 0;
    }

    pub fn text(&self) -> &str {
        &self.buffer.displayed_text
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.buffer.last_tail_fingerprint.as_deref()
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Length of the display buffer in characters
    pub fn len_chars(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }
}

/// Last `n` characters of `s`, or all of `s` if shorter
pub fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn byte_offset_of_char(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}
