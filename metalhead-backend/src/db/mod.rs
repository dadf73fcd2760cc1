mod sqlite;
mod tables;

pub use sqlite::{is_unique_violation, Database};
