use std::collections::HashMap;

use crate::{PageRecord, ROW_SUFFIX_SEPARATOR};

const TITLE_STOP_WORDS: &[&str] = &[
    "to", "a", "as", "the", "you", "in", "is", "i", "with", "of", "an", "and", "my", "your", "for",
    "on", "what", "her", "this", "that", "these", "those", "me",
];

/// Drop the trailing `**<row>` disambiguation suffixes, if any.
///
/// Only all-digit tails count as suffixes, so a name that itself contains the
/// separator is left whole.
pub fn strip_row_suffix(key: &str) -> &str {
    let mut name = key;
    while let Some((head, row)) = name.rsplit_once(ROW_SUFFIX_SEPARATOR) {
        if head.is_empty() || row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        name = head;
    }
    name
}

/// Counts per name in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    /// Count names after stripping any row suffix.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for name in names {
            table.add(strip_row_suffix(name.as_ref()));
        }
        table
    }

    fn add(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), 1));
            }
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.index
            .get(name)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names by descending count; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<&str> {
        ranked_by_value(self.iter())
    }
}

/// Keys ordered by descending value. The sort is stable, so equal values keep
/// their input order.
pub fn ranked_by_value<K, V: Ord>(entries: impl IntoIterator<Item = (K, V)>) -> Vec<K> {
    let mut entries: Vec<(K, V)> = entries.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(key, _)| key).collect()
}

/// Every commenter across the pages, suffix stripped, sorted.
pub fn all_commenters<'a, T: 'a>(pages: impl IntoIterator<Item = &'a PageRecord<T>>) -> Vec<String> {
    let mut names: Vec<String> = pages
        .into_iter()
        .flat_map(|page| page.keys().map(|key| strip_row_suffix(key).to_string()))
        .collect();
    names.sort();
    names
}

pub fn unique_commenters<'a, T: 'a>(
    pages: impl IntoIterator<Item = &'a PageRecord<T>>,
) -> Vec<String> {
    let mut names = all_commenters(pages);
    names.dedup();
    names
}

/// How often each commenter appears, in page order.
pub fn commenter_activity<'a, T: 'a>(
    pages: impl IntoIterator<Item = &'a PageRecord<T>>,
) -> FrequencyTable {
    FrequencyTable::from_names(pages.into_iter().flat_map(|page| page.keys()))
}

/// Word frequencies over topic titles, lower-cased, stop words removed.
pub fn title_word_count<'a>(titles: impl IntoIterator<Item = &'a str>) -> FrequencyTable {
    let words: Vec<String> = titles
        .into_iter()
        .flat_map(|title| title.split(is_title_separator))
        .map(str::to_lowercase)
        .filter(|word| !word.is_empty() && !TITLE_STOP_WORDS.contains(&word.as_str()))
        .collect();
    FrequencyTable::from_names(words)
}

fn is_title_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ';' | ',' | '.' | '+' | '-' | '(' | ')' | '/' | ':' | '?' | '[' | ']' | '—' | '–'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_stripped() {
        assert_eq!(strip_row_suffix("Seun**4"), "Seun");
        assert_eq!(strip_row_suffix("Seun"), "Seun");
        assert_eq!(strip_row_suffix("Seun**4**6"), "Seun");
    }

    #[test]
    fn separator_inside_a_name_is_kept() {
        assert_eq!(strip_row_suffix("**star**"), "**star**");
        assert_eq!(strip_row_suffix("a**b"), "a**b");
        assert_eq!(strip_row_suffix("a**b**2"), "a**b");
        assert_eq!(strip_row_suffix("**7"), "**7");
    }

    #[test]
    fn title_separators_cover_dashes() {
        assert!(is_title_separator('—'));
        assert!(is_title_separator('?'));
        assert!(!is_title_separator('\''));
    }
}
