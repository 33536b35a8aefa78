//! Filesystem utilities

use std::path::Path;

/// Check if a path exists
pub fn path_exists(path: &str) -> bool {
    Path::new(path).exists()
}

/// Check if a path points at a regular file
pub fn is_file(path: &str) -> bool {
    Path::new(path).is_file()
}
