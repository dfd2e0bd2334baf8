//! Cursor-based matcher over raw template text.
//!
//! The scanner never copies input: every match is a slice of the original
//! text. The cursor only moves forward.

use regex::Regex;

use super::error::ScanError;

/// A successful match, as a slice of the source plus its byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMatch<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Result of [`Scanner::scan_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanUntil<'a> {
    /// Text between the old cursor and the start of the match (or end of
    /// input when nothing matched).
    pub skipped: &'a str,
    /// Offset at which `skipped` starts.
    pub skipped_start: usize,
    /// The delimiter that stopped the scan, `None` when forced.
    pub matched: Option<ScanMatch<'a>>,
}

impl ScanUntil<'_> {
    /// True when no match was found and the rest of the input was consumed.
    pub fn is_forced(&self) -> bool {
        self.matched.is_none()
    }
}

#[derive(Debug)]
pub struct Scanner<'a> {
    source: &'a str,
    cursor: usize,
    last_match: Option<ScanMatch<'a>>,
    terminated: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: 0,
            last_match: None,
            terminated: false,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Unconsumed suffix, always `source[cursor..]`.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.cursor..]
    }

    pub fn last_match(&self) -> Option<ScanMatch<'a>> {
        self.last_match
    }

    pub fn is_done(&self) -> bool {
        self.terminated || self.cursor >= self.source.len()
    }

    /// Stop scanning. Later scans return no match and leave the cursor alone.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Match `pattern` exactly at the cursor.
    pub fn scan(&mut self, pattern: &Regex) -> Result<Option<ScanMatch<'a>>, ScanError> {
        if self.terminated {
            return Ok(None);
        }

        let found = match pattern.find_at(self.source, self.cursor) {
            Some(m) if m.start() == self.cursor => m,
            _ => return Ok(None),
        };

        let matched = ScanMatch {
            text: found.as_str(),
            start: found.start(),
            end: found.end(),
        };
        self.advance_to(matched.end)?;
        self.last_match = Some(matched);
        Ok(Some(matched))
    }

    /// Search ahead for the nearest match of `pattern`.
    ///
    /// Without a match the cursor moves to end of input and the result is
    /// forced; callers decide whether that is acceptable.
    pub fn scan_until(&mut self, pattern: &Regex) -> Result<ScanUntil<'a>, ScanError> {
        let skipped_start = self.cursor;
        if self.terminated {
            return Ok(ScanUntil {
                skipped: "",
                skipped_start,
                matched: None,
            });
        }

        match pattern.find_at(self.source, self.cursor) {
            Some(found) => {
                let matched = ScanMatch {
                    text: found.as_str(),
                    start: found.start(),
                    end: found.end(),
                };
                self.advance_to(matched.end)?;
                self.last_match = Some(matched);
                Ok(ScanUntil {
                    skipped: &self.source[skipped_start..matched.start],
                    skipped_start,
                    matched: Some(matched),
                })
            }
            None => {
                self.advance_to(self.source.len())?;
                Ok(ScanUntil {
                    skipped: &self.source[skipped_start..],
                    skipped_start,
                    matched: None,
                })
            }
        }
    }

    fn advance_to(&mut self, position: usize) -> Result<(), ScanError> {
        if position < self.cursor {
            return Err(ScanError::Rewind {
                from: self.cursor,
                to: position,
            });
        }
        if !self.source.is_char_boundary(position) {
            return Err(ScanError::CharBoundary { position });
        }
        self.cursor = position;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_scan_only_matches_at_cursor() {
        let mut scanner = Scanner::new("abc{{");
        assert_eq!(scanner.scan(&re(r"\{\{")).unwrap(), None);
        assert_eq!(scanner.position(), 0);

        let m = scanner.scan(&re("ab")).unwrap().unwrap();
        assert_eq!((m.text, m.start, m.end), ("ab", 0, 2));
        assert_eq!(scanner.remaining(), "c{{");
    }

    #[test]
    fn test_scan_until_records_match_and_skipped_text() {
        let mut scanner = Scanner::new("hello {{ name }}");
        let result = scanner.scan_until(&re(r"\{\{")).unwrap();
        assert!(!result.is_forced());
        assert_eq!(result.skipped, "hello ");
        assert_eq!(result.matched.unwrap().start, 6);
        assert_eq!(scanner.position(), 8);
        assert_eq!(scanner.last_match().unwrap().text, "{{");
    }

    #[test]
    fn test_scan_until_forced_consumes_rest() {
        let mut scanner = Scanner::new("plain text");
        let result = scanner.scan_until(&re(r"\{%")).unwrap();
        assert!(result.is_forced());
        assert_eq!(result.skipped, "plain text");
        assert!(scanner.is_done());
        assert_eq!(scanner.remaining(), "");
    }

    #[test]
    fn test_terminate_makes_scans_no_ops() {
        let mut scanner = Scanner::new("a{{b");
        scanner.terminate();
        assert_eq!(scanner.scan(&re("a")).unwrap(), None);
        let result = scanner.scan_until(&re(r"\{\{")).unwrap();
        assert!(result.is_forced());
        assert_eq!(result.skipped, "");
        assert_eq!(scanner.position(), 0);
        assert!(scanner.is_done());
    }

    #[test]
    fn test_multibyte_text_is_sliced_on_boundaries() {
        let mut scanner = Scanner::new("température {{ t }}");
        let result = scanner.scan_until(&re(r"\{\{")).unwrap();
        assert_eq!(result.skipped, "température ");
    }
}
