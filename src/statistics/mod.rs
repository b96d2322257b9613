pub mod collector;
pub mod format;
