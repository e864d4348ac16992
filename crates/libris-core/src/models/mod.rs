pub mod book;
pub mod search;
pub mod stats;

pub use book::*;
pub use search::*;
pub use stats::*;
