use crate::core::{CoreDecoder, DecodeResult};
use crate::records::{Row, RowBuilder};
use crate::utils::trim_bom;

/// Builds a [`Decoder`] with a custom configuration.
pub struct DecoderBuilder {
    delimiter: u8,
    quote: u8,
}

impl Default for DecoderBuilder {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl DecoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter. Must be an ASCII byte other than CR or LF.
    ///
    /// # Panics
    ///
    /// Panics if the delimiter is not ASCII or is a line terminator.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        assert_structural(delimiter, "delimiter");
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character. Must be an ASCII byte other than CR or LF.
    ///
    /// # Panics
    ///
    /// Panics if the quote is not ASCII or is a line terminator.
    pub fn quote(&mut self, quote: u8) -> &mut Self {
        assert_structural(quote, "quote");
        self.quote = quote;
        self
    }

    /// Create a [`Decoder`] over `text`.
    ///
    /// # Panics
    ///
    /// Panics if the delimiter and the quote are the same byte.
        pub fn from_str<'t>(&self, text: &'t str) -> Decoder<'t> {
        assert_ne!(
            self.delimiter, self.quote,
            "delimiter and quote must be different bytes"
        );

        Decoder {
            inner: CoreDecoder::new(self.delimiter, self.quote),
            text,
            pos: 0,
            row_start: 0,
            row_index: None,
        }
    }
}

fn assert_structural(byte: u8, what: &str) {
    assert!(byte.is_ascii(), "{} must be an ASCII byte", what);
    assert!(
        byte != b'\r' && byte != b'\n',
        "{} cannot be a line terminator",
        what
    );
}

/// A lenient streaming decoder over an in-memory CSV document.
///
/// The decoder never fails: ragged rows, mixed line terminators and
/// unterminated quoted fields are all accepted.
pub struct Decoder<'t> {
    inner: CoreDecoder,
    text: &'t str,
    pos: usize,
    row_start: usize,
    row_index: Option<u64>,
}

impl<'t> Decoder<'t> {
    pub fn new(text: &'t str) -> Self {
        DecoderBuilder::new().from_str(text)
    }

    #[inline(always)]
    fn strip_bom(&mut self) {
        if self.pos == 0 {
            self.pos = trim_bom(self.text);
        }
    }

    /// Byte offset, in the original text, of the start of the last decoded
    /// row.
    #[inline]
    pub fn row_position(&self) -> u64 {
        self.row_start as u64
    }

    /// Zero-based index of the last decoded row, if any was decoded yet.
    #[inline]
    pub fn row_index(&self) -> Option<u64> {
        self.row_index
    }

    pub fn count_rows(&mut self) -> u64 {
        let mut row = Row::new();
        let mut count: u64 = 0;

        while self.read_row(&mut row) {
            count += 1;
        }

        count
    }

    /// Decode the next row into `row`, reusing its allocation. Returns
    /// `false` when the document is exhausted.
    pub fn read_row(&mut self, row: &mut Row) -> bool {
        self.strip_bom();

        row.clear();

        let mut row_builder = RowBuilder::wrap(row);

        loop {
            let start = self.pos;
            let (result, pos) = self
                .inner
                .decode_row(&self.text[self.pos..], &mut row_builder);

            self.pos += pos;

            match result {
                DecodeResult::End => {
                    return false;
                }
                DecodeResult::Skip => {
                    continue;
                }
                DecodeResult::Row => {
                    self.row_start = start;
                    self.row_index = Some(self.row_index.map_or(0, |i| i + 1));
                    return true;
                }
            };
        }
    }
}

impl Iterator for Decoder<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = Row::new();

        if self.read_row(&mut row) {
            Some(row)
        } else {
            None
        }
    }
}

/// Decode a whole CSV document into its rows.
///
/// A leading byte-order mark is ignored, fields are unescaped then trimmed,
/// and rows are returned as-is: blank rows produced by whitespace-only lines
/// are kept for the caller to filter.
pub fn decode(text: &str) -> Vec<Row> {
    Decoder::new(text).collect()
}
