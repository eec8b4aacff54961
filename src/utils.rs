const BOM: char = '\u{feff}';

/// Returns the byte offset at which decoding should start, i.e. after a
/// leading byte-order mark if any.
#[inline]
pub fn trim_bom(text: &str) -> usize {
    if text.starts_with(BOM) {
        BOM.len_utf8()
    } else {
        0
    }
}

// NOTE: this is the same set of characters stripped by ECMAScript's `trim`,
// which is what spreadsheet exports are usually consumed with.
#[inline(always)]
pub fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || c == BOM
}

/// Returns the `(start, end)` bounds of `field` once trimmed, relative to
/// `field` itself.
#[inline]
pub fn trimmed_bounds(field: &str) -> (usize, usize) {
    let start = field.len() - field.trim_start_matches(is_trimmable).len();
    let end = field.trim_end_matches(is_trimmable).len();

    // NOTE: an all-whitespace field yields `end < start` otherwise
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_bom() {
        assert_eq!(trim_bom(""), 0);
        assert_eq!(trim_bom("name"), 0);
        assert_eq!(trim_bom("\u{feff}name"), 3);
        assert_eq!(trim_bom("na\u{feff}me"), 0);
    }

    #[test]
    fn test_trimmed_bounds() {
        assert_eq!(trimmed_bounds(""), (0, 0));
        assert_eq!(trimmed_bounds("   "), (3, 3));
        assert_eq!(trimmed_bounds(" john "), (1, 5));
        assert_eq!(trimmed_bounds("\u{feff}john\t"), (3, 7));
        assert_eq!(trimmed_bounds("\u{a0}أحمد\u{a0}"), (2, 10));
    }
}
