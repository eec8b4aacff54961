use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::utils::trimmed_bounds;

/// An owned, unescaped & trimmed representation of a decoded CSV row.
///
/// Fields are stored as ranges over a single string buffer so that a row can
/// be reused across reads without reallocating.
#[derive(Default, Clone, Eq)]
pub struct Row {
    data: String,
    bounds: Vec<(usize, usize)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields of the row.
    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether every field of the row is the empty string. A row
    /// without any field is also considered blank.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.bounds.iter().all(|(start, end)| start == end)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
        self.bounds.clear();
    }

    #[inline]
    pub fn iter(&self) -> RowIter<'_> {
        RowIter {
            row: self,
            current_forward: 0,
            current_backward: self.len(),
        }
    }

    /// Appends a field to the row, as-is.
    #[inline]
    pub fn push_field(&mut self, field: &str) {
        let start = self.data.len();
        self.data.push_str(field);
        self.bounds.push((start, self.data.len()));
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.bounds
            .get(index)
            .copied()
            .map(|(start, end)| &self.data[start..end])
    }

    /// Returns the nth field, or the empty string if the row is too short.
    #[inline]
    pub fn get_or_empty(&self, index: usize) -> &str {
        self.get(index).unwrap_or("")
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        if self.bounds.len() != other.bounds.len() {
            return false;
        }

        self.iter()
            .zip(other.iter())
            .all(|(self_field, other_field)| self_field == other_field)
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for Row {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(field, other_field)| field == other_field.as_ref())
    }
}

impl Hash for Row {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());

        for field in self.iter() {
            field.hash(state);
        }
    }
}

impl Index<usize> for Row {
    type Output = str;

    #[inline]
    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!("field index {} out of bounds for row of length {}", i, self.len()),
        }
    }
}

impl<T: AsRef<str>> Extend<T> for Row {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push_field(x.as_ref());
        }
    }
}

impl<T: AsRef<str>> FromIterator<T> for Row {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut row = Self::new();
        row.extend(iter);
        row
    }
}

impl From<Row> for Vec<String> {
    fn from(row: Row) -> Self {
        row.to_vec()
    }
}

impl<'r> IntoIterator for &'r Row {
    type IntoIter = RowIter<'r>;
    type Item = &'r str;

    #[inline]
    fn into_iter(self) -> RowIter<'r> {
        self.iter()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Row(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")?;
        Ok(())
    }
}

pub struct RowIter<'a> {
    row: &'a Row,
    current_forward: usize,
    current_backward: usize,
}

impl ExactSizeIterator for RowIter<'_> {}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_forward == self.current_backward {
            None
        } else {
            let (start, end) = self.row.bounds[self.current_forward];

            self.current_forward += 1;

            Some(&self.row.data[start..end])
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.current_backward - self.current_forward;

        (size, Some(size))
    }

    #[inline]
    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.len()
    }
}

impl DoubleEndedIterator for RowIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.current_forward == self.current_backward {
            None
        } else {
            self.current_backward -= 1;

            let (start, end) = self.row.bounds[self.current_backward];

            Some(&self.row.data[start..end])
        }
    }
}

/// Accumulates the raw characters of the field being decoded directly into
/// the row's buffer. Trimming happens when the field is finalized, by
/// narrowing its bounds rather than by copying.
pub(crate) struct RowBuilder<'r> {
    row: &'r mut Row,
    start: usize,
}

impl<'r> RowBuilder<'r> {
    #[inline(always)]
    pub(crate) fn wrap(row: &'r mut Row) -> Self {
        let start = row.data.len();
        Self { row, start }
    }

    #[inline(always)]
    pub(crate) fn push_str(&mut self, s: &str) {
        self.row.data.push_str(s);
    }

    #[inline(always)]
    pub(crate) fn push_char(&mut self, c: char) {
        self.row.data.push(c);
    }

    /// Whether something was accumulated for the current row, be it a
    /// finalized field or a non-empty (untrimmed) pending one.
    #[inline]
    pub(crate) fn is_pending(&self) -> bool {
        !self.row.bounds.is_empty() || self.row.data.len() > self.start
    }

    #[inline]
    pub(crate) fn finalize_field(&mut self) {
        let (trimmed_start, trimmed_end) = trimmed_bounds(&self.row.data[self.start..]);

        self.row
            .bounds
            .push((self.start + trimmed_start, self.start + trimmed_end));

        self.start = self.row.data.len();
    }

    #[inline]
    pub(crate) fn finalize_row(&mut self) {
        self.finalize_field();
    }
}
