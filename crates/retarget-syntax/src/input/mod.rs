//! Input readers - parse source code into the normalized tree.

pub mod json;

pub use json::{JSON_READER, JsonReader, read_json};

#[cfg(feature = "read-python")]
pub mod python;

#[cfg(feature = "read-python")]
pub use python::{PYTHON_READER, PythonReader, read_python};
