use std::io::{self, BufWriter, IntoInnerError, Write};

use memchr::{memchr, memchr3};

use crate::records::Row;

/// A CSV writer emitting text that [`decode`](crate::decode) reads back into
/// the same rows.
///
/// Since decoding trims fields, surrounding whitespace is never preserved,
/// quoted or not.
pub struct Writer<W: Write> {
    delimiter: u8,
    quote: u8,
    buffer: BufWriter<W>,
    scratch: Vec<u8>,
}

impl<W: Write> Writer<W> {
    pub fn from_writer(writer: W) -> Self {
        Self::with_capacity(writer, 8 * (1 << 10), b',', b'"')
    }

    pub fn with_capacity(writer: W, capacity: usize, delimiter: u8, quote: u8) -> Self {
        Self {
            buffer: BufWriter::with_capacity(capacity, writer),
            quote,
            delimiter,
            scratch: Vec::new(),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }

    fn must_quote(&self, field: &[u8]) -> bool {
        memchr3(self.delimiter, self.quote, b'\n', field).is_some() || memchr(b'\r', field).is_some()
    }

    fn quote(&mut self, field: &[u8]) {
        self.scratch.clear();
        self.scratch.push(self.quote);

        let mut rest = field;

        while let Some(offset) = memchr(self.quote, rest) {
            self.scratch.extend_from_slice(&rest[..=offset]);
            self.scratch.push(self.quote);
            rest = &rest[offset + 1..];
        }

        self.scratch.extend_from_slice(rest);
        self.scratch.push(self.quote);
    }

    pub fn write_row(&mut self, row: &Row) -> io::Result<()> {
        // NOTE: a lone empty field would be written as a blank line, which
        // is not a row when read back. A quoted space decodes to "" instead.
        if row.len() == 1 && row[0].is_empty() {
            self.buffer.write_all(&[self.quote, b' ', self.quote, b'\n'])?;
            return Ok(());
        }

        let last_i = row.len().saturating_sub(1);

        for (i, field) in row.iter().enumerate() {
            let field = field.as_bytes();

            if !self.must_quote(field) {
                self.buffer.write_all(field)?;
            } else {
                self.quote(field);
                self.buffer.write_all(&self.scratch)?;
            }

            if i != last_i {
                self.buffer.write_all(&[self.delimiter])?;
            }
        }

        self.buffer.write_all(b"\n")?;

        Ok(())
    }

    pub fn into_inner(self) -> Result<W, IntoInnerError<BufWriter<W>>> {
        self.buffer.into_inner()
    }
}

fn write_rows<'r, W, I>(writer: &mut Writer<W>, rows: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'r Row>,
{
    for row in rows {
        writer.write_row(row)?;
    }

    writer.flush()
}

/// Serialize rows into a CSV string using `,` and `"`.
pub fn encode<'r, I>(rows: I) -> String
where
    I: IntoIterator<Item = &'r Row>,
{
    let mut bytes = Vec::new();

    if let Err(err) = write_rows(&mut Writer::from_writer(&mut bytes), rows) {
        unreachable!("writing into a Vec cannot fail: {}", err);
    }

    // Fields are valid UTF-8 and only ASCII bytes are ever inserted
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    use crate::decoder::decode;

    #[test]
    fn test_write_row() -> io::Result<()> {
        let output = Cursor::new(Vec::<u8>::new());
        let mut writer = Writer::with_capacity(output, 32, b',', b'"');

        writer.write_row(&row!["name", "surname", "age"])?;
        writer.write_row(&row!["john,", "landis", "45"])?;
        writer.write_row(&row!["lucy", "get\ngot", "\"te,\"st\""])?;
        writer.write_row(&row!["cr\ronly", "أحمد"])?;

        assert_eq!(
            std::str::from_utf8(writer.into_inner()?.get_ref()).unwrap(),
            "name,surname,age\n\"john,\",landis,45\nlucy,\"get\ngot\",\"\"\"te,\"\"st\"\"\"\n\"cr\ronly\",أحمد\n",
        );

        Ok(())
    }

    #[test]
    fn test_encode_flushes_every_row() -> io::Result<()> {
        // More data than the writer's buffer holds
        let rows: Vec<Row> = (0..2000)
            .map(|i| row![&i.to_string(), "a,b", "\"q\""])
            .collect();

        let mut writer = Writer::from_writer(Vec::new());
        write_rows(&mut writer, &rows)?;
        let expected = String::from_utf8(writer.into_inner()?).unwrap();

        let encoded = encode(&rows);

        assert_eq!(encoded, expected);
        assert!(encoded.ends_with("1999,\"a,b\",\"\"\"q\"\"\"\n"));
        assert_eq!(decode(&encoded), rows);

        Ok(())
    }

    #[test]
    fn test_lone_empty_field() {
        assert_eq!(encode(&[row![""]]), "\" \"\n");
        assert_eq!(encode(&[row!["", ""]]), ",\n");
        assert_eq!(decode(&encode(&[row![""], row!["x"]])), vec![row![""], row!["x"]]);
    }

    #[test]
    fn test_decode_encode_is_idempotent() {
        let tests = vec![
            "a,\"b,c\",d",
            "a,\"b\"\"c\",d\r\ne,f",
            "a,\"line1\nline2\",b\rc",
            "\u{feff}م,اسم الدارس\n1, أَحْمَد ,\"\"\n",
            "   \n,,\n\"\"\"\"\nx",
            "ab\"c,d\"e,\"never closed\nx,y",
            "\"\",\"\"",
            "a,b,",
        ];

        for test in tests.iter() {
            let rows = decode(test);

            assert_eq!(decode(&encode(&rows)), rows, "string={:?}", test);
        }
    }
}
