//! Parser modules

pub mod clarion;

pub use clarion::tokenize_raw;
