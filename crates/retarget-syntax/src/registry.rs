//! Registry of built-in readers.
//!
//! The list is assembled once, on first use, and never changes afterwards.

use crate::traits::Reader;
use std::sync::OnceLock;

static READERS: OnceLock<Vec<&'static dyn Reader>> = OnceLock::new();

fn init_readers() -> &'static [&'static dyn Reader] {
    READERS.get_or_init(|| {
        let mut readers: Vec<&'static dyn Reader> = vec![&crate::input::json::JSON_READER];
        #[cfg(feature = "read-python")]
        {
            readers.push(&crate::input::python::PYTHON_READER);
        }
        readers
    })
}

/// Get a reader by dialect name.
pub fn reader_for_dialect(dialect: &str) -> Option<&'static dyn Reader> {
    init_readers()
        .iter()
        .find(|r| r.dialect() == dialect)
        .copied()
}

/// Get a reader by file extension.
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    init_readers()
        .iter()
        .find(|r| r.extensions().contains(&ext))
        .copied()
}

/// Get all registered readers.
pub fn readers() -> Vec<&'static dyn Reader> {
    init_readers().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reader_lookup() {
        let reader = reader_for_dialect("json").expect("json reader");
        assert_eq!(reader.dialect(), "json");
        assert!(reader.extensions().contains(&"json"));
    }

    #[test]
    #[cfg(feature = "read-python")]
    fn test_python_reader_lookup() {
        let reader = reader_for_dialect("python").expect("python reader");
        assert_eq!(reader.dialect(), "python");

        let reader = reader_for_extension("py").expect("py extension");
        assert_eq!(reader.dialect(), "python");
    }

    #[test]
    fn test_unknown_dialect() {
        assert!(reader_for_dialect("cobol").is_none());
        assert!(readers().iter().all(|r| r.dialect() != "cobol"));
    }
}
