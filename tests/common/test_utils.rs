//! Temporary file helpers shared by the integration tests.

use std::io::Write;
use tempfile::NamedTempFile;

/// Creates a temporary file holding `content`, removed when dropped.
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
