pub mod file_finder;
pub mod validation;
