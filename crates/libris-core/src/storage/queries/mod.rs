mod book_search;
mod stats;

pub use book_search::BookSearchQuery;
pub use stats::LibraryStatsQuery;
