//! Content digests used to skip unchanged outputs.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Computes SHA256 hash of a string, returning hex-encoded digest.
pub fn hexdigest_str(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes SHA256 hash of a file, returning hex-encoded digest.
pub fn hexdigest_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digest of an existing file, `None` when the file does not exist.
pub fn existing_digest(path: &Path) -> io::Result<Option<String>> {
    match hexdigest_file(path) {
        Ok(digest) => Ok(Some(digest)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_hexdigest_str() {
        assert_eq!(hexdigest_str("hello world"), HELLO_WORLD);
        assert_eq!(
            hexdigest_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_file_and_string_digests_agree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.c");
        fs::write(&path, "hello world").unwrap();

        assert_eq!(hexdigest_file(&path).unwrap(), HELLO_WORLD);
        assert_eq!(existing_digest(&path).unwrap().as_deref(), Some(HELLO_WORLD));
    }

    #[test]
    fn test_missing_file_has_no_digest() {
        let dir = tempdir().unwrap();
        assert_eq!(existing_digest(&dir.path().join("absent")).unwrap(), None);
    }
}
