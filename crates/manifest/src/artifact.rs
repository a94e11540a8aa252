//! Writing of generated artifacts.

use std::path::Path;

use sha2::{Digest, Sha256};

/// SHA-256 digest of `content`, hex encoded.
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fully rewrite the artifact at `path` with `content`, creating parent
/// directories as needed. Returns the digest of the written content.
pub fn write_artifact(path: &Path, content: &str) -> std::io::Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;

    let digest = digest(content);
    tracing::info!(path = %path.display(), sha256 = %digest, "Artifact written");

    Ok(digest)
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_rewrite_replaces_previous_content() {
        let dir = TempDir::new("subgrapher-artifact").unwrap();
        let path = dir.path().join("nested/main.graphql");

        let first = write_artifact(&path, "type A @entity { id: ID! }\n").unwrap();
        let second = write_artifact(&path, "type B @entity { id: ID! }\n").unwrap();

        assert_ne!(first, second);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "type B @entity { id: ID! }\n"
        );
        assert_eq!(second, digest("type B @entity { id: ID! }\n"));
    }
}
