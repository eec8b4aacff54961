/*!
The `roster-search` crate provides the two pieces of engineering behind a
student-records dashboard fed by a published spreadsheet's CSV export:

1. a lenient CSV decoder recovering rows from untrusted, loosely-escaped text
   (quoted fields, embedded delimiters & newlines, doubled-quote escaping, optional
   byte-order mark, any mix of `\n`, `\r` and `\r\n` line terminators);
2. a language-aware fuzzy matcher letting users search multilingual (mostly Arabic)
   free text without having to agree on diacritics, letter variants or case.

Both are pure functions over strings: they perform no I/O, hold no global state
and never fail.

On top of them, a small roster layer maps decoded rows to [`Student`]s, sets the
header row aside, drops blank rows, filters students and computes dashboard
figures, such as unpaid fees or expired and soon-expiring ID documents.

# Examples

*Decoding a whole document*

```
use roster_search::decode;

let rows = decode("\u{feff}name,notes\r\nahmad,\"likes \"\"tajweed\"\", reads daily\"\n");

assert_eq!(rows.len(), 2);
assert_eq!(&rows[1][1], "likes \"tajweed\", reads daily");
```

*Decoding while amortizing allocations*

```
use roster_search::{Decoder, Row};

let mut decoder = Decoder::new(text);
let mut row = Row::new();

while decoder.read_row(&mut row) {
    for field in row.iter() {
        dbg!(field);
    }
}
```

*Matching a query*

```
use roster_search::{matches, Matcher};

assert!(matches("أَحْمَد علي", "احمد"));
assert!(!matches("ab cd", "cd ab"));

// Normalize the query once when testing many haystacks
let matcher = Matcher::new("فاطمه");

for name in ["فاطمة الزهراء", "خديجة"] {
    dbg!(matcher.is_match(name));
}
```

*Loading a roster*

```
use roster_search::{HeaderPolicy, RosterLoaderBuilder};

let roster = RosterLoaderBuilder::new()
    .header(HeaderPolicy::Sniff)
    .flexible(false)
    .build()
    .load(&text)?;

for student in roster.filter("احمد", Some("الأول")) {
    println!("{} {}", student.id, student.name);
}
```

# Decoding rules

The decoder is a two-state machine (`Unquoted` / `Quoted`) scanning the text for
structural characters with [`memchr`](https://docs.rs/memchr/latest/memchr/):

- a quote character enters quoting wherever it appears, there is no concept of
  "beginning of field", so `ab"c,d"e` is the single field `abc,de`;
- inside quotes, a doubled quote is a literal quote and a lone one exits quoting,
  while delimiters & newlines are data;
- outside quotes, a delimiter ends a field and `\n`, `\r` or `\r\n` ends a row;
- every field is trimmed once unescaped;
- a line terminator only emits a row if some field or delimiter was seen, which
  means blank lines are skipped but whitespace-only lines yield a row with a
  single empty field;
- a quoted field left open at the end of the input is closed implicitly.

Decoding is not a validation step: ragged rows are returned as-is and the
decoder never errors. Callers wanting strictness must check the shape of what
they get, as the [`RosterLoader`] does when it is not flexible.

# Normalization rules

[`normalize`] maps Arabic presentation forms back to plain letters, deletes
Arabic diacritics & tatweel, folds alef forms to `ا`, alef
maksura to `ي` and taa marbuta to `ه`, folds Arabic-Indic digits to ASCII,
lowercases and finally collapses whitespace. Matching is plain substring
containment over normalized text: an empty query matches everything and word
order matters.
*/
#[allow(unused_macros)]
macro_rules! row {
    () => {{
        $crate::records::Row::new()
    }};

    ($($x: expr),*) => {{
        let mut r = $crate::records::Row::new();

        $(
            r.push_field($x);
        )*

        r
    }};
}

mod core;
mod decoder;
mod error;
mod matcher;
mod normalize;
mod records;
mod roster;
mod stats;
mod utils;
mod writer;

pub use decoder::{decode, Decoder, DecoderBuilder};
pub use error::{Error, ErrorKind, Position, Result};
pub use matcher::{matches, Matcher};
pub use normalize::{normalize, normalize_into};
pub use records::{Row, RowIter};
pub use roster::{
    default_header_markers, sniff_header, HeaderMarker, HeaderPolicy, Roster, RosterLoader,
    RosterLoaderBuilder, Student, EXPIRING_SOON_DAYS, PAID,
};
pub use stats::{RosterStats, LEVEL_ORDER, UNSPECIFIED_LEVEL};
pub use writer::{encode, Writer};
