mod sqlite;
pub mod tables;

pub use sqlite::Database;
pub(crate) use sqlite::timestamp;
