//! Zero-allocation line parsing utilities.
//!
//! These helpers work on borrowed bytes and never allocate, so the record
//! and mapping loaders only pay for the strings they keep.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters, or
/// does not fit in a u64.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Split off the first two tab-delimited columns of a line.
///
/// Anything after a second tab is ignored. Returns None when the line has
/// no tab at all.
#[inline]
pub fn split_two_columns(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let tab1 = memchr(b'\t', line)?;
    let first = &line[..tab1];
    let rest = &line[tab1 + 1..];
    let second_len = memchr(b'\t', rest).unwrap_or(rest.len());
    Some((first, &rest[..second_len]))
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"-5"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_split_two_columns() {
        assert_eq!(
            split_two_columns(b"GENE1\tHGNC:1"),
            Some((&b"GENE1"[..], &b"HGNC:1"[..]))
        );
        assert_eq!(
            split_two_columns(b"GENE1\tHGNC:1\textra"),
            Some((&b"GENE1"[..], &b"HGNC:1"[..]))
        );
        assert_eq!(split_two_columns(b"GENE1"), None);
        assert_eq!(
            split_two_columns(b"GENE1\t"),
            Some((&b"GENE1"[..], &b""[..]))
        );
    }

    #[test]
    fn test_trim_line_end() {
        assert_eq!(trim_line_end("chr1\t1\t2\n"), "chr1\t1\t2");
        assert_eq!(trim_line_end("chr1\t1\t2\r\n"), "chr1\t1\t2");
        assert_eq!(trim_line_end("chr1\t1\t2"), "chr1\t1\t2");
        assert_eq!(trim_line_end("a\tb\t\n"), "a\tb\t");
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track name=foo"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }
}
