use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{LibrisError, Result};

/// Image extensions accepted for uploaded covers.
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Used when the configured table has no entry for the fallback genre either.
const BUILTIN_FALLBACK: &str = "default_other.jpg";

/// Resolves cover image paths: uploaded files are copied into the cover
/// directory, books without one get a genre-keyed default.
#[derive(Debug, Clone)]
pub struct Covers {
    dir: PathBuf,
    defaults: BTreeMap<String, String>,
    fallback_genre: String,
}

impl Covers {
    pub fn new(
        dir: impl Into<PathBuf>,
        defaults: BTreeMap<String, String>,
        fallback_genre: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            defaults,
            fallback_genre: fallback_genre.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.covers_dir(),
            config.covers.defaults.clone(),
            config.covers.fallback_genre.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Default cover for `genre`. Lookup is exact; unknown genres fall back.
    pub fn default_for(&self, genre: &str) -> PathBuf {
        let file = self
            .defaults
            .get(genre)
            .or_else(|| self.defaults.get(&self.fallback_genre))
            .map(String::as_str)
            .unwrap_or(BUILTIN_FALLBACK);
        self.dir.join(file)
    }

    /// Copy an uploaded image into the cover directory, keeping its file name.
    pub fn store_upload(&self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(LibrisError::CoverNotFound(source.display().to_string()));
        }

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !COVER_EXTENSIONS.contains(&ext.as_str()) {
            return Err(LibrisError::Validation(format!(
                "cover image must be one of {}: {}",
                COVER_EXTENSIONS.join(", "),
                source.display()
            )));
        }

        let name = source
            .file_name()
            .ok_or_else(|| LibrisError::Validation(format!("invalid cover path: {}", source.display())))?;

        self.ensure_dir()?;
        let dest = self.dir.join(name);
        if is_same_file(source, &dest) {
            tracing::debug!(dest = %dest.display(), "cover upload already in cover directory");
            return Ok(dest);
        }
        if dest.exists() {
            tracing::warn!(dest = %dest.display(), "overwriting existing cover image");
        }
        fs::copy(source, &dest)?;
        tracing::debug!(src = %source.display(), dest = %dest.display(), "stored cover upload");
        Ok(dest)
    }

    /// The upload if one was given, otherwise the genre default.
    pub fn resolve(&self, upload: Option<&Path>, genre: &str) -> Result<PathBuf> {
        match upload {
            Some(source) => self.store_upload(source),
            None => Ok(self.default_for(genre)),
        }
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoverConfig;
    use tempfile::TempDir;

    fn covers(dir: &Path) -> Covers {
        Covers::new(dir.join("covers"), CoverConfig::default().defaults, "Other")
    }

    #[test]
    fn test_default_for_known_genre() {
        let c = covers(Path::new("/lib"));
        assert_eq!(c.default_for("Fantasy"), PathBuf::from("/lib/covers/default_fantasy.jpg"));
        assert_eq!(
            c.default_for("Non-Fiction"),
            PathBuf::from("/lib/covers/default_nonfiction.jpg")
        );
    }

    #[test]
    fn test_default_for_unknown_genre_falls_back() {
        let c = covers(Path::new("/lib"));
        assert_eq!(c.default_for("Poetry"), PathBuf::from("/lib/covers/default_other.jpg"));
        // lookup is exact
        assert_eq!(c.default_for("fantasy"), PathBuf::from("/lib/covers/default_other.jpg"));
    }

    #[test]
    fn test_fallback_without_other_entry() {
        let c = Covers::new("/lib/covers", BTreeMap::new(), "Other");
        assert_eq!(c.default_for("Fiction"), PathBuf::from("/lib/covers/default_other.jpg"));
    }

    #[test]
    fn test_store_upload_copies_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("dune.PNG");
        fs::write(&src, b"\x89PNG").unwrap();

        let c = covers(dir.path());
        let dest = c.store_upload(&src).unwrap();

        assert_eq!(dest, dir.path().join("covers").join("dune.PNG"));
        assert_eq!(fs::read(&dest).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_store_upload_from_cover_dir_keeps_contents() {
        let dir = TempDir::new().unwrap();
        let c = covers(dir.path());
        c.ensure_dir().unwrap();
        let src = c.dir().join("mine.jpg");
        fs::write(&src, b"12345678").unwrap();

        let dest = c.store_upload(&src).unwrap();
        assert_eq!(dest, src);
        assert_eq!(fs::read(&dest).unwrap(), b"12345678");

        // same file reached through a different spelling of the path
        let dotted = dir.path().join("covers").join(".").join("mine.jpg");
        c.store_upload(&dotted).unwrap();
        assert_eq!(fs::metadata(&src).unwrap().len(), 8);
    }

    #[test]
    fn test_store_upload_rejects_other_extensions() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("notes.txt");
        fs::write(&src, b"text").unwrap();

        let err = covers(dir.path()).store_upload(&src).unwrap_err();
        assert!(matches!(err, LibrisError::Validation(_)));
    }

    #[test]
    fn test_store_upload_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = covers(dir.path())
            .store_upload(&dir.path().join("gone.jpg"))
            .unwrap_err();
        assert!(matches!(err, LibrisError::CoverNotFound(_)));
    }

    #[test]
    fn test_resolve_prefers_upload() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("mine.jpg");
        fs::write(&src, b"jpg").unwrap();

        let c = covers(dir.path());
        assert_eq!(
            c.resolve(Some(&src), "Fiction").unwrap(),
            dir.path().join("covers").join("mine.jpg")
        );
        assert_eq!(
            c.resolve(None, "Fiction").unwrap(),
            dir.path().join("covers").join("default_fiction.jpg")
        );
    }
}
