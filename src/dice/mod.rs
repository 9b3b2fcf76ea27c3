//! Dice core
//!
//! - Face trees with weights and hidden layers
//! - Parsing face specs (comma lists, JSON + JSONPath, base64, URLs)
//! - Weighted-descent rolling, with or without replacement

mod face;
mod fetch;
mod parser;
mod roll;

pub use face::Face;
pub use fetch::JsonFetcher;
pub use parser::{FaceOptions, FaceParser, Payload};
pub use roll::{
    roll_many, roll_many_with, roll_many_without_replacement, roll_many_without_replacement_with,
    roll_once, roll_once_with, DEFAULT_SEPARATOR,
};
