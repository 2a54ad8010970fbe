//! Source-text preparation applied on the client side of a request.
//!
//! Editors hand us cursors in various shapes; analysis always works on a
//! byte offset into a shebang-free buffer. The helpers here normalize one
//! into the other.

/// Strip a leading `#!` line from the source, returning the remaining view
/// and the number of bytes removed (for cursor adjustment).
///
/// A shebang with no terminating newline leaves nothing to analyze.
pub fn strip_shebang(src: &[u8]) -> (&[u8], usize) {
    if !src.starts_with(b"#!") {
        return (src, 0);
    }
    match src.iter().position(|&b| b == b'\n') {
        Some(nl) => (&src[nl + 1..], nl + 1),
        None => (&src[src.len()..], src.len()),
    }
}

/// Convert a codepoint offset into a byte offset by walking the source.
///
/// Offsets past the end of the text saturate to `src.len()`. Bytes that do
/// not start a UTF-8 sequence are not counted, so malformed input degrades
/// gracefully rather than panicking.
pub fn codepoint_to_byte_offset(src: &[u8], codepoints: usize) -> usize {
    let mut remaining = codepoints;
    for (i, &b) in src.iter().enumerate() {
        // Count only UTF-8 sequence starts.
        if b & 0xc0 != 0x80 {
            if remaining == 0 {
                return i;
            }
            remaining -= 1;
        }
    }
    src.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_removed_and_counted() {
        let (rest, n) = strip_shebang(b"#!/usr/bin/env gorun\npackage main\n");
        assert_eq!(rest, b"package main\n");
        assert_eq!(n, 21);
    }

    #[test]
    fn no_shebang_passthrough() {
        let (rest, n) = strip_shebang(b"package main\n");
        assert_eq!(rest, b"package main\n");
        assert_eq!(n, 0);
    }

    #[test]
    fn unterminated_shebang_consumes_everything() {
        let (rest, n) = strip_shebang(b"#!/bin/sh");
        assert!(rest.is_empty());
        assert_eq!(n, 9);
    }

    #[test]
    fn codepoint_conversion_multibyte() {
        // "héllo": h=1 byte, é=2 bytes
        let src = "héllo".as_bytes();
        assert_eq!(codepoint_to_byte_offset(src, 0), 0);
        assert_eq!(codepoint_to_byte_offset(src, 1), 1);
        assert_eq!(codepoint_to_byte_offset(src, 2), 3);
        assert_eq!(codepoint_to_byte_offset(src, 5), 6);
        assert_eq!(codepoint_to_byte_offset(src, 99), 6);
    }
}
