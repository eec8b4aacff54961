use memchr::memmem::Finder;

use crate::normalize::{normalize, normalize_into};

/// A search query normalized once, to be tested against many haystacks.
///
/// Matching is plain containment of the normalized query inside the
/// normalized haystack: word order matters and no edit distance is involved.
/// An empty query (or one normalizing to nothing) matches everything.
#[derive(Clone, Debug)]
pub struct Matcher {
    query: String,
    finder: Finder<'static>,
}

impl Matcher {
    pub fn new(query: &str) -> Self {
        let query = normalize(query);
        let finder = Finder::new(query.as_bytes()).into_owned();

        Self { query, finder }
    }

    /// The normalized query.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the matcher accepts any haystack.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        self.is_match_normalized(&normalize(haystack))
    }

    /// Same as [`Self::is_match`], but normalizes the haystack into the
    /// given scratch buffer instead of allocating.
    pub fn is_match_with(&self, haystack: &str, scratch: &mut String) -> bool {
        if self.is_empty() {
            return true;
        }

        normalize_into(haystack, scratch);
        self.is_match_normalized(scratch)
    }

    /// Test a haystack that was already normalized.
    #[inline]
    pub fn is_match_normalized(&self, normalized_haystack: &str) -> bool {
        self.finder.find(normalized_haystack.as_bytes()).is_some()
    }
}

/// Whether `query` is found in `haystack` once both are normalized.
pub fn matches(haystack: &str, query: &str) -> bool {
    Matcher::new(query).is_match(haystack)
}
