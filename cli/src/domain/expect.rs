//! Pattern matching over an accumulating byte stream.
//!
//! `ExpectBuffer` holds everything received from the remote that has not
//! yet been consumed by a match. Matching runs on raw bytes, so a
//! multi-byte character split across two reads still matches once the
//! second half arrives.

use regex::bytes::Regex;

/// A successful match against the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Index of the winning pattern in the candidate list.
    pub index: usize,
    /// Everything buffered before the match, lossily decoded as UTF-8.
    pub before: String,
    /// The matched text itself.
    pub matched: String,
}

/// Unconsumed output from the remote side of a session.
#[derive(Debug, Default)]
pub struct ExpectBuffer {
    data: Vec<u8>,
}

impl ExpectBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Test every pattern against the buffer.
    ///
    /// The match starting earliest wins; on equal starts the lower index
    /// wins. A match consumes the buffer up to the end of the matched text.
    pub fn find(&mut self, patterns: &[Regex]) -> Option<PatternMatch> {
        let (index, start, end) = patterns
            .iter()
            .enumerate()
            .filter_map(|(index, re)| re.find(&self.data).map(|m| (index, m.start(), m.end())))
            .min_by_key(|&(index, start, _)| (start, index))?;

        let before = String::from_utf8_lossy(&self.data[..start]).into_owned();
        let matched = String::from_utf8_lossy(&self.data[start..end]).into_owned();
        self.data.drain(..end);
        Some(PatternMatch {
            index,
            before,
            matched,
        })
    }

    /// Buffered text without consuming it.
    #[must_use]
    pub fn pending(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Drain the whole buffer.
    pub fn take(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.data).into_owned();
        self.data.clear();
        text
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Compile a literal string into a pattern matching it verbatim.
///
/// # Panics
///
/// Never: an escaped literal is always a valid expression.
#[must_use]
#[allow(clippy::expect_used)]
pub fn literal(text: &str) -> Regex {
    Regex::new(&regex::escape(text)).expect("escaped literal is a valid regex")
}

/// Compile a list of literals.
#[must_use]
pub fn literals(texts: &[&str]) -> Vec<Regex> {
    texts.iter().map(|t| literal(t)).collect()
}

/// Human-readable form of a candidate list, for error messages.
#[must_use]
pub fn describe(patterns: &[Regex]) -> String {
    patterns
        .iter()
        .map(|re| format!("'{}'", re.as_str()))
        .collect::<Vec<_>>()
        .join(" or ")
}
