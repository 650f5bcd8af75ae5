use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Separator between a repeated key and the row index that disambiguates it.
pub const ROW_SUFFIX_SEPARATOR: &str = "**";
/// Author used for a quotation block without a readable author label.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";
/// Commenter name used when no name selector matches.
pub const NOBODY: &str = "Nobody";

/// Quoted text keyed by author, in first-insertion order.
///
/// Inserting an author that is already present replaces the text in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quotes {
    entries: Vec<(String, String)>,
}

impl Quotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced text when `author` was already quoted.
    pub fn insert(&mut self, author: impl Into<String>, text: impl Into<String>) -> Option<String> {
        let author = author.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == author) {
            Some((_, slot)) => Some(std::mem::replace(slot, text)),
            None => {
                self.entries.push((author, text));
                None
            }
        }
    }

    pub fn get(&self, author: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == author)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(author, text)| (author.as_str(), text.as_str()))
    }

    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(author, _)| author.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Quotes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (author, text) in &self.entries {
            map.serialize_entry(author, text)?;
        }
        map.end()
    }
}

/// One comment cell split into the focus user's own words and what they quoted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedComment {
    focus_text: String,
    quotes: Quotes,
}

impl ParsedComment {
    pub fn new(focus_text: impl Into<String>, quotes: Quotes) -> Self {
        Self {
            focus_text: focus_text.into(),
            quotes,
        }
    }

    pub fn focus_text(&self) -> &str {
        &self.focus_text
    }

    pub fn quotes(&self) -> &Quotes {
        &self.quotes
    }

    /// Quotes flattened to `"<author> says\n<text>"` blocks separated by newlines.
    pub fn quotes_as_text(&self) -> String {
        self.quotes
            .iter()
            .map(|(author, text)| format!("{author} says\n{text}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A comment from a user's history together with the topic it was posted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicComment {
    pub topic: String,
    pub comment: ParsedComment,
}

/// One topic row of a section listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub poster: String,
    pub title: String,
    pub url: String,
    /// Comment count as displayed, which includes the opening post.
    pub comments: u32,
}

/// Ordered, key-unique mapping of commenter or section name to a page entry.
///
/// A key seen again on the same page is stored as `key**<row>`, so both
/// entries stay addressable and the row index is recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord<T> {
    entries: Vec<(String, T)>,
}

impl<T> PageRecord<T> {
    /// Build a record from `(key, row_index, value)` rows in page order.
    pub fn from_rows<K: Into<String>>(rows: impl IntoIterator<Item = (K, usize, T)>) -> Self {
        let mut entries: Vec<(String, T)> = Vec::new();
        for (key, row_index, value) in rows {
            let mut key = key.into();
            while entries.iter().any(|(existing, _)| *existing == key) {
                key = format!("{key}{ROW_SUFFIX_SEPARATOR}{row_index}");
            }
            entries.push((key, value));
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for PageRecord<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Serialize> Serialize for PageRecord<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A selector chain that ran out of options. The page is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralAnomaly {
    /// No name selector matched; the sentinel name was used.
    MissingName { row: usize },
    /// No comment cell selector matched.
    MissingComment { row: usize },
    /// No section link in a history row; the previous value was carried over.
    MissingSection { row: usize },
    /// No topic link in a history row; the previous value was carried over.
    MissingTopic { row: usize },
    /// A name row at the end of the table without a comment row.
    UnpairedRow { row: usize },
    /// A section listing cell without a title link or poster/count block.
    MalformedTopic { cell: usize },
}

impl fmt::Display for StructuralAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralAnomaly::MissingName { row } => write!(f, "row {row}: no commenter name"),
            StructuralAnomaly::MissingComment { row } => write!(f, "row {row}: no comment cell"),
            StructuralAnomaly::MissingSection { row } => write!(f, "row {row}: no section link"),
            StructuralAnomaly::MissingTopic { row } => write!(f, "row {row}: no topic link"),
            StructuralAnomaly::UnpairedRow { row } => {
                write!(f, "row {row}: name row without comment row")
            }
            StructuralAnomaly::MalformedTopic { cell } => {
                write!(f, "topic cell {cell}: missing title or meta block")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_author_replaces_in_place() {
        let mut quotes = Quotes::new();
        assert_eq!(quotes.insert("Alice", "first"), None);
        quotes.insert("Bob", "hi");
        assert_eq!(quotes.insert("Alice", "second"), Some("first".to_string()));
        let collected: Vec<_> = quotes.iter().collect();
        assert_eq!(collected, vec![("Alice", "second"), ("Bob", "hi")]);
    }

    #[test]
    fn quotes_flatten_to_says_blocks() {
        let mut quotes = Quotes::new();
        quotes.insert("Alice", "one");
        quotes.insert("Bob", "two");
        let comment = ParsedComment::new("mine", quotes);
        assert_eq!(comment.quotes_as_text(), "Alice says\none\nBob says\ntwo");
    }
}
