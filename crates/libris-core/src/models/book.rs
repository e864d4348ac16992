use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::covers::Covers;
use crate::error::{LibrisError, Result};

pub const MIN_YEAR: i64 = 1000;
pub const MAX_YEAR: i64 = 9999;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_RATING: u8 = 3;

/// Backend-assigned identifier: 1-based list position in the JSON file,
/// autoincrement row id in SQLite.
pub type BookId = i64;

// ─── Book ───────────────────────────────────────────────────

/// A validated book record. Field names are the on-disk JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
    pub read_status: bool,
    pub rating: u8,

    #[serde(default)]
    pub favorite: bool,

    #[serde(default)]
    pub cover_image: String,
}

impl Book {
    /// Check the record invariants every stored book must satisfy.
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        require_text("genre", &self.genre)?;

        if !(MIN_YEAR..=MAX_YEAR).contains(&i64::from(self.year)) {
            return Err(LibrisError::Validation(format!(
                "year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
                self.year
            )));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(LibrisError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                self.rating
            )));
        }
        Ok(())
    }

    /// The cover path, only if the file is actually present on disk.
    pub fn existing_cover(&self) -> Option<&Path> {
        let path = Path::new(&self.cover_image);
        (!self.cover_image.is_empty() && path.is_file()).then_some(path)
    }

    pub fn status_label(&self) -> &'static str {
        if self.read_status { "Read" } else { "Unread" }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}) - {} - {} - Rating: {}",
            self.title,
            self.author,
            self.year,
            self.genre,
            self.status_label(),
            self.rating
        )?;
        if self.favorite {
            write!(f, " (Favorite)")?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibrisError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// ─── Draft ──────────────────────────────────────────────────

/// Unchecked user input for a new book.
#[derive(Debug, Clone, Default)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub genre: String,
    pub read_status: bool,
    pub rating: Option<u8>,
    pub favorite: bool,
    /// Image to copy into the cover directory. Without one the genre default is used.
    pub cover_upload: Option<PathBuf>,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: i64,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
            genre: genre.into(),
            ..Default::default()
        }
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read_status = read;
        self
    }

    pub fn rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn cover(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover_upload = Some(path.into());
        self
    }

    /// Validate the draft and resolve its cover image.
    ///
    /// The upload is only copied once every other field has passed, so a
    /// rejected draft leaves the cover directory untouched.
    pub fn into_book(self, covers: &Covers) -> Result<Book> {
        let year = i32::try_from(self.year)
            .ok()
            .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(&i64::from(*y)))
            .ok_or_else(|| {
                LibrisError::Validation(format!(
                    "year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
                    self.year
                ))
            })?;

        let mut book = Book {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            year,
            genre: self.genre.trim().to_string(),
            read_status: self.read_status,
            rating: self.rating.unwrap_or(DEFAULT_RATING),
            favorite: self.favorite,
            cover_image: String::new(),
        };
        book.validate()?;

        let cover = covers.resolve(self.cover_upload.as_deref(), &book.genre)?;
        book.cover_image = cover.to_string_lossy().to_string();
        Ok(book)
    }
}

// ─── Stored records ─────────────────────────────────────────

/// A book as returned by a store, paired with its backend id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBook {
    pub id: BookId,
    #[serde(flatten)]
    pub book: Book,
}

impl StoredBook {
    pub fn new(id: BookId, book: Book) -> Self {
        Self { id, book }
    }
}

impl fmt::Display for StoredBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.id, self.book)
    }
}

/// Selector for `BookStore::remove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookKey {
    Id(BookId),
    /// Exact title match; every record carrying the title is removed.
    Title(String),
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Title(title) => write!(f, "title \"{title}\""),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────
