use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row as returned by a collection; shape varies per collection.
pub type RawRecord = Map<String, Value>;

/// Terms at or below this many characters are never executed.
pub const MIN_TERM_CHARS: usize = 2;

/// Body characters kept in a preview before the ellipsis.
pub const PREVIEW_CHARS: usize = 150;

/// A trimmed search term long enough to be worth querying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    text: String,
    key: String,
}

impl SearchTerm {
    pub fn parse(raw: &str) -> Option<SearchTerm> {
        let text = raw.trim();
        if text.chars().count() <= MIN_TERM_CHARS {
            return None;
        }
        Some(SearchTerm {
            text: text.to_string(),
            key: text.to_lowercase(),
        })
    }

    /// The trimmed term as typed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lowercased term used for case-insensitive matching.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lowercased term with Portuguese diacritics removed.
    pub fn folded(&self) -> String {
        fold_diacritics(&self.key)
    }

    /// Case-insensitive substring test against `haystack`.
    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.key)
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn fold_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Video,
    Audio,
    Book,
    Article,
    Summary,
    Flashcard,
    News,
    Statute,
    Blog,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Video,
        Category::Audio,
        Category::Book,
        Category::Article,
        Category::Summary,
        Category::Flashcard,
        Category::News,
        Category::Statute,
        Category::Blog,
    ];

    /// Lower ranks first. Video, summary, statute and article lead; every
    /// other category shares the lowest priority.
    pub fn priority(self) -> u8 {
        match self {
            Category::Video => 0,
            Category::Summary => 1,
            Category::Statute => 2,
            Category::Article => 3,
            _ => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Book => "book",
            Category::Article => "article",
            Category::Summary => "summary",
            Category::Flashcard => "flashcard",
            Category::News => "news",
            Category::Statute => "statute",
            Category::Blog => "blog",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// `<collection>-<record id>`, unique within one response.
    pub id: String,
    pub collection: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub category_label: String,
    pub area: String,
    pub preview: String,
    pub metadata: Map<String, Value>,
}

/// Caps `content` at [`PREVIEW_CHARS`] characters, appending `...` when cut.
pub fn make_preview(content: &str) -> String {
    let content = content.trim();
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}
