pub mod json_backend;

use std::path::Path;

use crate::control::ControlBook;
use crate::errors::ControlError;

pub type Result<T> = std::result::Result<T, ControlError>;

/// Abstraction over persistence backends capable of storing control
/// books. The library only ever needs whole-book snapshots; anything
/// finer grained belongs to the host platform.
pub trait StorageBackend: Send + Sync {
    fn save(&self, book: &ControlBook, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<ControlBook>;
    fn list_books(&self) -> Result<Vec<String>>;

    /// Ad-hoc file operations; default implementations forward to the
    /// JSON helpers.
    fn save_to_path(&self, book: &ControlBook, path: &Path) -> Result<()> {
        json_backend::save_book_to_path(book, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<ControlBook> {
        json_backend::load_book_from_path(path)
    }
}

pub use json_backend::JsonStorage;
