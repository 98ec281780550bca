use indexmap::IndexMap;

/// TermCounts struct
/// Counts how often each term occurs, in first-seen order.
/// Used per document during transform and corpus-wide during fit.
///
/// # Examples
/// ```
/// use vampire_preprocess::vectorizer::term::TermCounts;
/// let mut counts = TermCounts::new();
/// counts.add_term("topic");
/// counts.add_term("model");
/// counts.add_term("topic");
///
/// assert_eq!(counts.term_count("topic"), 2);
/// assert_eq!(counts.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TermCounts {
    term_count: IndexMap<String, u64>,
}

impl TermCounts {
    pub fn new() -> Self {
        TermCounts {
            term_count: IndexMap::new(),
        }
    }

    /// Add one occurrence of `term`
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self
    }

    /// Add one occurrence of each term
    #[inline]
    pub fn add_terms<I, T>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// number of distinct terms
    #[inline]
    pub fn len(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    /// Terms and counts in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// The `limit` most frequent terms, returned in alphabetical order.
    ///
    /// Candidates are ranked on a stable sort by descending count over the
    /// alphabetical order, so ties at the cut fall to the earlier term.
    pub fn most_frequent(&self, limit: Option<usize>) -> Vec<String> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        ranked.sort_unstable_by(|a, b| a.0.cmp(b.0));
        if let Some(limit) = limit {
            if limit < ranked.len() {
                ranked.sort_by(|a, b| b.1.cmp(&a.1));
                ranked.truncate(limit);
                ranked.sort_unstable_by(|a, b| a.0.cmp(b.0));
            }
        }
        ranked.into_iter().map(|(term, _)| term.to_string()).collect()
    }
}

impl<T> FromIterator<T> for TermCounts
where
    T: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut counts = TermCounts::new();
        counts.add_terms(iter);
        counts
    }
}
