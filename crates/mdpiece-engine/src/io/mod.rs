use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a markdown file and return its content
pub fn read_file(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Write content to a markdown file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::write(path, content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_file_not_found() {
        let dir = TempDir::new().unwrap();
        let result = read_file(&dir.path().join("missing.md"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_then_read() {
        // Given an empty directory
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");

        // When writing a file
        write_file(&path, "# Note\n\nbody\n").unwrap();

        // Then reading returns the same content
        assert_eq!(read_file(&path).unwrap(), "# Note\n\nbody\n");
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder").join("sub").join("note.md");

        write_file(&path, "x").unwrap();

        assert!(dir.path().join("folder").join("sub").is_dir());
        assert_eq!(read_file(&path).unwrap(), "x");
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        write_file(&path, "old").unwrap();

        write_file(&path, "new").unwrap();

        assert_eq!(read_file(&path).unwrap(), "new");
    }
}
