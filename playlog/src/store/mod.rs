mod base;
pub mod csv_file;
pub mod memory;

pub use base::*;
