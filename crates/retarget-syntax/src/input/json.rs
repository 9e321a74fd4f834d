//! Reader for the serialized tree.
//!
//! External front ends can emit the tree as JSON and hand it to the engine
//! without linking against this crate.

use crate::ir::Program;
use crate::traits::{ReadError, Reader};

/// Static instance of the JSON reader for registry.
pub static JSON_READER: JsonReader = JsonReader;

/// Reader for JSON-serialized programs.
pub struct JsonReader;

impl Reader for JsonReader {
    fn dialect(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read(&self, source: &str) -> Result<Program, ReadError> {
        read_json(source)
    }
}

/// Parse a JSON-serialized program.
pub fn read_json(source: &str) -> Result<Program, ReadError> {
    serde_json::from_str(source).map_err(|err| ReadError::Parse(err.to_string()))
}
