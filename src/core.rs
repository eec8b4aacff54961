use memchr::{memchr, memchr3};

use crate::records::RowBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    /// A line terminator was consumed while nothing was pending.
    Skip,
    Row,
    End,
}

#[derive(Debug, Clone, Copy)]
enum ParseState {
    Unquoted,
    Quoted,
}

// Absolute position of the next CR when none is left in the text.
const NO_CR: usize = usize::MAX;

pub(crate) struct CoreDecoder {
    pub(crate) delimiter: u8,
    pub(crate) quote: u8,
    state: ParseState,
    // Absolute position of `input[0]`, i.e. everything consumed so far.
    offset: usize,
    // Absolute position of the first CR at or after the last scan origin.
    next_cr: Option<usize>,
}

impl CoreDecoder {
    pub(crate) fn new(delimiter: u8, quote: u8) -> Self {
        debug_assert!(delimiter.is_ascii() && quote.is_ascii());

        Self {
            delimiter,
            quote,
            state: ParseState::Unquoted,
            offset: 0,
            next_cr: None,
        }
    }

    // Finds, relative to `pos`, the next byte having structural meaning
    // outside of quotes. The next CR is remembered across calls so that
    // every byte of the text is searched for it only once: `memchr3` never
    // looks past that CR.
    #[inline]
    fn find_structural(&mut self, bytes: &[u8], pos: usize) -> Option<usize> {
        let here = self.offset + pos;

        let next_cr = match self.next_cr {
            Some(cr) if cr >= here => cr,
            _ => {
                let cr = memchr(b'\r', &bytes[pos..]).map_or(NO_CR, |offset| here + offset);
                self.next_cr = Some(cr);
                cr
            }
        };

        if next_cr == NO_CR {
            return memchr3(self.delimiter, self.quote, b'\n', &bytes[pos..]);
        }

        let bound = next_cr - self.offset;

        memchr3(self.delimiter, self.quote, b'\n', &bytes[pos..bound]).or(Some(bound - pos))
    }

    /// Decodes the next row from `input`, which must hold the whole text
    /// remaining after what previous calls consumed. Returns what happened
    /// and the number of bytes consumed.
    ///
    /// Reaching the end of `input` flushes any pending field & row, even when
    /// a quoted field was never closed.
    pub(crate) fn decode_row(
        &mut self,
        input: &str,
        row_builder: &mut RowBuilder,
    ) -> (DecodeResult, usize) {
        let (result, consumed) = self.decode_from(input, row_builder);

        self.offset += consumed;

        (result, consumed)
    }

    fn decode_from(&mut self, input: &str, row_builder: &mut RowBuilder) -> (DecodeResult, usize) {
        use ParseState::*;

        let bytes = input.as_bytes();
        let input_len = bytes.len();

        // NOTE: all structural bytes are ASCII, so every `pos` we slice at
        // is guaranteed to be a char boundary.
        let mut pos: usize = 0;

        loop {
            match self.state {
                Unquoted => {
                    let offset = match self.find_structural(bytes, pos) {
                        Some(offset) => offset,
                        None => {
                            row_builder.push_str(&input[pos..]);
                            break;
                        }
                    };

                    row_builder.push_str(&input[pos..pos + offset]);

                    let byte = bytes[pos + offset];

                    pos += offset + 1;

                    if byte == self.quote {
                        self.state = Quoted;
                    } else if byte == self.delimiter {
                        row_builder.finalize_field();
                    } else {
                        // Here, `byte` is guaranteed to be either CR or LF
                        if byte == b'\r' && pos < input_len && bytes[pos] == b'\n' {
                            pos += 1;
                        }

                        if row_builder.is_pending() {
                            row_builder.finalize_row();
                            return (DecodeResult::Row, pos);
                        }

                        return (DecodeResult::Skip, pos);
                    }
                }
                Quoted => {
                    // Here we are moving to next quote
                    let offset = match memchr(self.quote, &bytes[pos..]) {
                        Some(offset) => offset,
                        None => {
                            // Unterminated quoted field: closed implicitly at EOF
                            row_builder.push_str(&input[pos..]);
                            self.state = Unquoted;
                            break;
                        }
                    };

                    row_builder.push_str(&input[pos..pos + offset]);

                    pos += offset + 1;

                    if pos < input_len && bytes[pos] == self.quote {
                        row_builder.push_char(self.quote as char);
                        pos += 1;
                    } else {
                        self.state = Unquoted;
                    }
                }
            }
        }

        if row_builder.is_pending() {
            row_builder.finalize_row();
            return (DecodeResult::Row, input_len);
        }

        (DecodeResult::End, input_len)
    }
}
