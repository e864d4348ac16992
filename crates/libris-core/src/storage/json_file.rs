use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::models::{Book, BookId, BookKey, LibraryStats, SearchField, StoredBook};

use super::{Backend, BookStore};

/// Load the book list from a JSON file. A missing or blank file is an empty library.
pub fn load_books(path: &Path) -> Result<Vec<Book>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let books: Vec<Book> = serde_json::from_str(&contents)?;
    Ok(books)
}

/// Rewrite the whole JSON file (4-space indented array).
pub fn save_books(path: &Path, books: &[Book]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    books.serialize(&mut ser)?;
    fs::write(path, buf)?;
    Ok(())
}

/// File backend: the whole collection lives in memory and is written back
/// after every mutation. Ids are 1-based positions in the list.
pub struct JsonFileStore {
    path: PathBuf,
    books: Vec<Book>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let books = load_books(&path)?;
        tracing::debug!(path = %path.display(), count = books.len(), "loaded library file");
        Ok(Self { path, books })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    fn save(&self) -> Result<()> {
        save_books(&self.path, &self.books)?;
        tracing::debug!(path = %self.path.display(), count = self.books.len(), "saved library file");
        Ok(())
    }

    fn stored(&self) -> impl Iterator<Item = StoredBook> + '_ {
        self.books
            .iter()
            .enumerate()
            .map(|(i, book)| StoredBook::new(position_id(i), book.clone()))
    }
}

fn position_id(index: usize) -> BookId {
    index as BookId + 1
}

impl BookStore for JsonFileStore {
    fn list_all(&self) -> Result<Vec<StoredBook>> {
        Ok(self.stored().collect())
    }

    fn add(&mut self, book: Book) -> Result<StoredBook> {
        book.validate()?;
        self.books.push(book.clone());
        self.save()?;

        let id = position_id(self.books.len() - 1);
        tracing::info!(id, title = %book.title, "added book");
        Ok(StoredBook::new(id, book))
    }

    fn remove(&mut self, key: &BookKey) -> Result<usize> {
        let before = self.books.len();
        match key {
            BookKey::Title(title) => self.books.retain(|b| &b.title != title),
            BookKey::Id(id) => {
                let index = id
                    .checked_sub(1)
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i < self.books.len());
                if let Some(index) = index {
                    self.books.remove(index);
                }
            }
        }

        let removed = before - self.books.len();
        if removed > 0 {
            self.save()?;
            tracing::info!(%key, removed, "removed books");
        } else {
            tracing::debug!(%key, "nothing to remove");
        }
        Ok(removed)
    }

    fn search(&self, field: SearchField, term: &str) -> Result<Vec<StoredBook>> {
        Ok(self
            .stored()
            .filter(|s| field.matches(&s.book, term))
            .collect())
    }

    fn statistics(&self) -> Result<LibraryStats> {
        Ok(LibraryStats::from_books(&self.books))
    }

    fn backend(&self) -> Backend {
        Backend::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibrisError;
    use tempfile::TempDir;

    fn book(title: &str, genre: &str, read: bool) -> Book {
        Book {
            title: title.to_string(),
            author: "Author".to_string(),
            year: 2001,
            genre: genre.to_string(),
            read_status: read,
            rating: 3,
            favorite: false,
            cover_image: "covers/default_other.jpg".to_string(),
        }
    }

    fn store(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::open(dir.path().join("library.json")).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_library() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        assert!(s.list_all().unwrap().is_empty());
        assert!(!s.path().exists());
    }

    #[test]
    fn test_blank_file_is_empty_library() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("library.json"), "  \n").unwrap();
        assert!(store(&dir).books().is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("library.json"), "{not json").unwrap();
        let err = JsonFileStore::open(dir.path().join("library.json")).err();
        assert!(matches!(err, Some(LibrisError::Json(_))));
    }

    #[test]
    fn test_add_then_list_returns_book() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        let added = s.add(book("Dune", "Science", true)).unwrap();
        assert_eq!(added.id, 1);

        let all = s.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], added);
    }

    #[test]
    fn test_add_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("Dune", "Science", true)).unwrap();
        s.add(book("Dune", "Science", true)).unwrap();

        let reopened = store(&dir);
        assert_eq!(reopened.books().len(), 2, "duplicates are kept");
        assert_eq!(reopened.books()[0].title, "Dune");
    }

    #[test]
    fn test_add_rejects_invalid_book() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        let err = s.add(book("", "Science", false)).unwrap_err();
        assert!(matches!(err, LibrisError::Validation(_)));
        assert!(!s.path().exists());
    }

    #[test]
    fn test_file_format_has_no_ids() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("Dune", "Science", true)).unwrap();

        let raw = fs::read_to_string(s.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert!(value[0].get("id").is_none());
        assert_eq!(value[0]["title"], "Dune");
        assert!(raw.contains("\n        \"title\""), "four-space indent");

        assert_eq!(load_books(s.path()).unwrap(), s.books());
    }

    #[test]
    fn test_remove_by_title_leaves_others() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("A", "Fiction", false)).unwrap();
        s.add(book("B", "Fiction", false)).unwrap();
        s.add(book("C", "Fiction", false)).unwrap();

        assert_eq!(s.remove(&BookKey::Title("B".to_string())).unwrap(), 1);
        let reopened = store(&dir);
        let titles: Vec<&str> = reopened.books().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn test_remove_by_title_drops_every_duplicate() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("A", "Fiction", false)).unwrap();
        s.add(book("A", "Fiction", true)).unwrap();
        s.add(book("B", "Fiction", false)).unwrap();

        assert_eq!(s.remove(&BookKey::Title("A".to_string())).unwrap(), 2);
        assert_eq!(s.books().len(), 1);
    }

    #[test]
    fn test_remove_by_position_id() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("A", "Fiction", false)).unwrap();
        s.add(book("A", "Fiction", true)).unwrap();

        assert_eq!(s.remove(&BookKey::Id(2)).unwrap(), 1);
        assert_eq!(s.books().len(), 1);
        assert!(!s.books()[0].read_status);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("A", "Fiction", false)).unwrap();
        let modified = fs::metadata(s.path()).unwrap().modified().unwrap();

        assert_eq!(s.remove(&BookKey::Title("Z".to_string())).unwrap(), 0);
        assert_eq!(s.remove(&BookKey::Id(0)).unwrap(), 0);
        assert_eq!(s.remove(&BookKey::Id(5)).unwrap(), 0);
        assert_eq!(s.books().len(), 1);
        assert_eq!(fs::metadata(s.path()).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_search_genre_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.add(book("A", "Fantasy", false)).unwrap();
        s.add(book("B", "Horror", false)).unwrap();
        s.add(book("C", "dark FANTASY", false)).unwrap();

        let hits = s.search(SearchField::Genre, "Fantasy").unwrap();
        let ids: Vec<BookId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, [1, 3]);
        assert!(hits.iter().all(|h| h.book.genre.to_lowercase().contains("fantasy")));
    }

    #[test]
    fn test_statistics() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        assert!(s.statistics().unwrap().is_empty());

        s.add(book("A", "Fiction", true)).unwrap();
        s.add(book("B", "Fiction", false)).unwrap();
        s.add(book("C", "Fiction", false)).unwrap();

        let stats = s.statistics().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.read, 1);
        assert_eq!(stats.read_percentage, 33.3);
    }
}
