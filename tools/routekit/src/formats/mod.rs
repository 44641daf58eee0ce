//! Binary file formats

pub mod crc;
pub mod hierarchy;

pub use hierarchy::FormatError;
