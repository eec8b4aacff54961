//! Canonical form of free text used for search comparisons.
//!
//! The canonical form is only ever compared, never displayed: it strips
//! Arabic diacritics & tatweel, folds Arabic letter variants (and digits) to
//! one representative, lowercases everything and collapses whitespace.

use std::cmp::Ordering;

/// Inclusive ranges of Arabic combining marks (harakat, tanwin, shadda,
/// sukun, Quranic annotation signs...), deleted during normalization.
const DIACRITICS: &[(char, char)] = &[
    ('\u{0610}', '\u{061A}'),
    ('\u{064B}', '\u{065F}'),
    ('\u{0670}', '\u{0670}'),
    ('\u{06D6}', '\u{06DC}'),
    ('\u{06DF}', '\u{06E4}'),
    ('\u{06E7}', '\u{06E8}'),
    ('\u{06EA}', '\u{06ED}'),
];

const TATWEEL: char = '\u{0640}';

/// Letter-shape variants and their representative. Must stay sorted by
/// source character.
const LETTER_FOLDS: &[(char, char)] = &[
    ('\u{0622}', '\u{0627}'), // آ -> ا
    ('\u{0623}', '\u{0627}'), // أ -> ا
    ('\u{0625}', '\u{0627}'), // إ -> ا
    ('\u{0629}', '\u{0647}'), // ة -> ه
    ('\u{0649}', '\u{064A}'), // ى -> ي
    ('\u{0671}', '\u{0627}'), // ٱ -> ا
    ('\u{06CC}', '\u{064A}'), // ی -> ي
];

/// Arabic presentation forms B (contextual glyph shapes, as produced by some
/// PDF or legacy exports) and the nominal text they stand for. Spacing marks
/// stand for nothing, lam-alef ligatures for two letters. Must stay sorted.
/// Presentation forms A are not mapped.
const PRESENTATION_FORMS: &[(char, char, &str)] = &[
    ('\u{FE70}', '\u{FE7F}', ""),
    ('\u{FE80}', '\u{FE80}', "\u{0621}"), // ء
    ('\u{FE81}', '\u{FE82}', "\u{0622}"), // آ
    ('\u{FE83}', '\u{FE84}', "\u{0623}"), // أ
    ('\u{FE85}', '\u{FE86}', "\u{0624}"), // ؤ
    ('\u{FE87}', '\u{FE88}', "\u{0625}"), // إ
    ('\u{FE89}', '\u{FE8C}', "\u{0626}"), // ئ
    ('\u{FE8D}', '\u{FE8E}', "\u{0627}"), // ا
    ('\u{FE8F}', '\u{FE92}', "\u{0628}"), // ب
    ('\u{FE93}', '\u{FE94}', "\u{0629}"), // ة
    ('\u{FE95}', '\u{FE98}', "\u{062A}"), // ت
    ('\u{FE99}', '\u{FE9C}', "\u{062B}"), // ث
    ('\u{FE9D}', '\u{FEA0}', "\u{062C}"), // ج
    ('\u{FEA1}', '\u{FEA4}', "\u{062D}"), // ح
    ('\u{FEA5}', '\u{FEA8}', "\u{062E}"), // خ
    ('\u{FEA9}', '\u{FEAA}', "\u{062F}"), // د
    ('\u{FEAB}', '\u{FEAC}', "\u{0630}"), // ذ
    ('\u{FEAD}', '\u{FEAE}', "\u{0631}"), // ر
    ('\u{FEAF}', '\u{FEB0}', "\u{0632}"), // ز
    ('\u{FEB1}', '\u{FEB4}', "\u{0633}"), // س
    ('\u{FEB5}', '\u{FEB8}', "\u{0634}"), // ش
    ('\u{FEB9}', '\u{FEBC}', "\u{0635}"), // ص
    ('\u{FEBD}', '\u{FEC0}', "\u{0636}"), // ض
    ('\u{FEC1}', '\u{FEC4}', "\u{0637}"), // ط
    ('\u{FEC5}', '\u{FEC8}', "\u{0638}"), // ظ
    ('\u{FEC9}', '\u{FECC}', "\u{0639}"), // ع
    ('\u{FECD}', '\u{FED0}', "\u{063A}"), // غ
    ('\u{FED1}', '\u{FED4}', "\u{0641}"), // ف
    ('\u{FED5}', '\u{FED8}', "\u{0642}"), // ق
    ('\u{FED9}', '\u{FEDC}', "\u{0643}"), // ك
    ('\u{FEDD}', '\u{FEE0}', "\u{0644}"), // ل
    ('\u{FEE1}', '\u{FEE4}', "\u{0645}"), // م
    ('\u{FEE5}', '\u{FEE8}', "\u{0646}"), // ن
    ('\u{FEE9}', '\u{FEEC}', "\u{0647}"), // ه
    ('\u{FEED}', '\u{FEEE}', "\u{0648}"), // و
    ('\u{FEEF}', '\u{FEF0}', "\u{0649}"), // ى
    ('\u{FEF1}', '\u{FEF4}', "\u{064A}"), // ي
    ('\u{FEF5}', '\u{FEF6}', "\u{0644}\u{0622}"), // لآ
    ('\u{FEF7}', '\u{FEF8}', "\u{0644}\u{0623}"), // لأ
    ('\u{FEF9}', '\u{FEFA}', "\u{0644}\u{0625}"), // لإ
    ('\u{FEFB}', '\u{FEFC}', "\u{0644}\u{0627}"), // لا
];

/// Arabic-Indic digit blocks, folded to ASCII digits.
const DIGIT_BLOCKS: &[char] = &['\u{0660}', '\u{06F0}'];

#[inline]
fn is_stripped(c: char) -> bool {
    if !('\u{0610}'..='\u{06ED}').contains(&c) {
        return false;
    }

    c == TATWEEL || DIACRITICS.iter().any(|&(lo, hi)| lo <= c && c <= hi)
}

#[inline]
fn fold(c: char) -> char {
    if !('\u{0622}'..='\u{06F9}').contains(&c) {
        return c;
    }

    if let Ok(i) = LETTER_FOLDS.binary_search_by_key(&c, |&(from, _)| from) {
        return LETTER_FOLDS[i].1;
    }

    for &zero in DIGIT_BLOCKS {
        let offset = (c as u32).wrapping_sub(zero as u32);

        if offset < 10 {
            return char::from(b'0' + offset as u8);
        }
    }

    c
}

#[inline]
fn presentation_form(c: char) -> Option<&'static str> {
    if !('\u{FE70}'..='\u{FEFC}').contains(&c) {
        return None;
    }

    PRESENTATION_FORMS
        .binary_search_by(|&(lo, hi, _)| {
            if hi < c {
                Ordering::Less
            } else if lo > c {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .ok()
        .map(|i| PRESENTATION_FORMS[i].2)
}

struct Canonicalizer<'o> {
    out: &'o mut String,
    pending_space: bool,
}

impl Canonicalizer<'_> {
    fn push(&mut self, c: char) {
        if c.is_whitespace() {
            // Leading whitespace is dropped altogether
            self.pending_space = !self.out.is_empty();
            return;
        }

        if is_stripped(c) {
            return;
        }

        if self.pending_space {
            self.out.push(' ');
            self.pending_space = false;
        }

        self.out.extend(fold(c).to_lowercase());
    }
}

/// Normalize `s` into `out`, which is cleared first, so that callers
/// normalizing many strings can amortize the allocation.
pub fn normalize_into(s: &str, out: &mut String) {
    out.clear();
    out.reserve(s.len());

    let mut canonicalizer = Canonicalizer {
        out,
        pending_space: false,
    };

    for c in s.chars() {
        match presentation_form(c) {
            Some(nominal) => nominal.chars().for_each(|c| canonicalizer.push(c)),
            None => canonicalizer.push(c),
        }
    }
}

/// Map `s` to its canonical comparable form. Total: any input, including
/// the empty string, yields a (possibly empty) string.
pub fn normalize(s: &str) -> String {
    let mut out = String::new();
    normalize_into(s, &mut out);
    out
}
