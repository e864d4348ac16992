mod book_repository;

pub use book_repository::{BookRepository, SqliteBookRepository};
pub(crate) use book_repository::{BOOK_COLUMNS, row_to_stored};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn insert(&self, entity: &Self::Entity) -> Result<Self::Id>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
