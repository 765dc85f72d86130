//! Reassembles lines from arbitrarily sized output chunks.

/// Carry-over buffer turning a chunked byte stream into complete lines.
///
/// Lines end at `\n`; one trailing `\r` is removed so both `\r\n` and `\n`
/// terminators work, including a `\r\n` split across two chunks. Bytes are
/// only decoded once a line is complete, so multi-byte characters may
/// straddle chunks. Empty lines are dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    carry: Vec<u8>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        complete
            .split(|&b| b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Flush the unterminated tail, if any.
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.carry);
        decode_line(&tail)
    }

    /// Bytes waiting for a line terminator.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(raw).into_owned())
    }
}
