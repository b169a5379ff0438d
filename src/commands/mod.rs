pub mod db;
pub mod insights;
pub mod logs;
pub mod profile;
pub mod settings;
