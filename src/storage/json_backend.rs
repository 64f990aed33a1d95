use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::control::{book::CURRENT_SCHEMA_VERSION, ControlBook};
use crate::errors::ControlError;

use super::{Result, StorageBackend};

const BOOK_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const HOME_ENV: &str = "CREDIT_CONTROL_HOME";

/// JSON file persistence for control books, one file per named book
/// under a data directory.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    books_dir: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(default_base_dir);
        ensure_dir(&root)?;
        let books_dir = root.join("books");
        ensure_dir(&books_dir)?;
        Ok(Self { root, books_dir })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn book_path(&self, name: &str) -> PathBuf {
        self.books_dir
            .join(format!("{}.{}", canonical_name(name), BOOK_EXTENSION))
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, book: &ControlBook, name: &str) -> Result<()> {
        let path = self.book_path(name);
        save_book_to_path(book, &path)
    }

    fn load(&self, name: &str) -> Result<ControlBook> {
        let path = self.book_path(name);
        if !path.exists() {
            return Err(ControlError::Storage(format!(
                "control book `{name}` not found"
            )));
        }
        load_book_from_path(&path)
    }

    fn list_books(&self) -> Result<Vec<String>> {
        if !self.books_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.books_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BOOK_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

pub fn save_book_to_path(book: &ControlBook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(book)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_book_from_path(path: &Path) -> Result<ControlBook> {
    let data = fs::read_to_string(path)?;
    let book: ControlBook = serde_json::from_str(&data)?;
    if book.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(ControlError::Storage(format!(
            "book schema v{} is newer than supported v{}",
            book.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(book)
}

/// Resolves the storage root: the env override first, then the
/// platform data dir, then the current directory.
fn default_base_dir() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return PathBuf::from(home);
    }
    dirs::data_dir()
        .map(|dir| dir.join("credit_control"))
        .unwrap_or_else(|| PathBuf::from(".credit_control"))
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "book".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
