use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LibrisError;
use crate::models::Book;

/// The book fields a search can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Author,
    Genre,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [Self::Title, Self::Author, Self::Genre];

    /// Column name in the `books` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Genre => "genre",
        }
    }

    pub fn value_of(self, book: &Book) -> &str {
        match self {
            Self::Title => &book.title,
            Self::Author => &book.author,
            Self::Genre => &book.genre,
        }
    }

    /// Case-insensitive substring match against this field of `book`.
    pub fn matches(self, book: &Book, term: &str) -> bool {
        self.value_of(book)
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SearchField {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "genre" => Ok(Self::Genre),
            _ => Err(LibrisError::InvalidSearchField(s.to_string())),
        }
    }
}
