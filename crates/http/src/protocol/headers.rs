//! Case-insensitive HTTP header collection.
//!
//! [`Headers`] stores field names case-folded to ASCII lowercase and merges
//! duplicate insertions into a single comma-joined value, as field lists are
//! combined in HTTP/1.1. It also carries the incremental line parser used by
//! the request parser: [`Headers::parse_line`] consumes at most one header
//! line per call and never fails on partial input.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::ensure;
use crate::protocol::{ParseError, find_crlf};

/// A case-insensitive mapping from header name to header value.
///
/// Names are validated against the RFC 7230 token character set on the
/// parsing path and stored lowercase. Inserting a name that already exists
/// appends the new value joined by `", "` rather than overwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Default::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Inserts a value, merging with any existing value for the same name.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => {
                let merged = entry.get_mut();
                merged.push_str(", ");
                merged.push_str(value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value.to_string());
            }
        }
    }

    /// Replaces any existing value instead of merging.
    pub fn replace(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&name.to_ascii_lowercase());
    }

    /// Iterates `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes at most one header line from `data`.
    ///
    /// Returns `(consumed, section_done)`:
    ///
    /// - no CRLF in `data` yet: `Ok((0, false))`, call again with more bytes
    /// - CRLF at offset 0: `Ok((2, true))`, the header section has ended
    /// - otherwise one `name: value` line was inserted and `consumed`
    ///   includes its CRLF
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidHeader`] when the line has no `:`
    /// separator, the name ends in whitespace, or the name contains a byte
    /// outside the token character set.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(line_end) = find_crlf(data) else {
            return Ok((0, false));
        };
        if line_end == 0 {
            return Ok((2, true));
        }

        let line = data[..line_end].trim_ascii();
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| ParseError::invalid_header("missing ':' separator"))?;
        let (name, rest) = line.split_at(colon);

        ensure!(!name.is_empty(), ParseError::invalid_header("empty header name"));
        ensure!(
            !name[name.len() - 1].is_ascii_whitespace(),
            ParseError::invalid_header("whitespace between header name and ':'")
        );
        for &byte in name {
            ensure!(
                is_token_char(byte),
                ParseError::invalid_header(format!("invalid character 0x{byte:02x} in header name"))
            );
        }

        let name = name.iter().map(|b| b.to_ascii_lowercase() as char).collect::<String>();
        let value = String::from_utf8_lossy(rest[1..].trim_ascii());
        self.set(&name, &value);

        Ok((line_end + 2, false))
    }
}

/// The RFC 7230 token character set permitted in header field names.
fn is_token_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}
