pub mod insight;
pub mod log_entry;
pub mod profile;
pub mod summary;
