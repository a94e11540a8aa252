//! File system utils.

use std::{io, path::Path};

use serde::Deserialize;

pub struct FsHandler;

#[derive(Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

impl FsHandler {
    /// Move the directory `from` to `to`, replacing whatever `to` held.
    ///
    /// Returns `false` without touching anything when `from` does not exist.
    pub fn relocate_dir(from: &Path, to: &Path) -> io::Result<bool> {
        if !from.is_dir() {
            tracing::debug!(path = %from.display(), "Nothing to relocate");
            return Ok(false);
        }

        if to.exists() {
            std::fs::remove_dir_all(to)?;
        }
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(from, to)?;

        tracing::debug!(from = %from.display(), to = %to.display(), "Relocated directory");
        Ok(true)
    }

    /// The `version` field of a `package.json`.
    ///
    /// `None` when the file is missing, unparsable or has no version.
    pub fn package_version(path: &Path) -> Option<String> {
        let content = std::fs::read_to_string(path)
            .inspect_err(|err| {
                tracing::debug!(path = %path.display(), err = %err, "No package manifest");
            })
            .ok()?;

        match serde_json::from_str::<PackageManifest>(&content) {
            Ok(manifest) => manifest.version,
            Err(err) => {
                tracing::warn!(path = %path.display(), err = %err, "Unparsable package manifest");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_relocate_replaces_destination() {
        let dir = TempDir::new("subgrapher-fs").unwrap();
        let from = dir.path().join("perps/FuturesMarketManager");
        let to = dir.path().join("futures/FuturesMarketManager");
        std::fs::create_dir_all(&from).unwrap();
        std::fs::write(from.join("FuturesMarketManager.ts"), "new").unwrap();
        std::fs::create_dir_all(&to).unwrap();
        std::fs::write(to.join("stale.ts"), "old").unwrap();

        assert!(FsHandler::relocate_dir(&from, &to).unwrap());

        assert!(!from.exists());
        assert!(!to.join("stale.ts").exists());
        assert_eq!(
            std::fs::read_to_string(to.join("FuturesMarketManager.ts")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_relocate_missing_source_is_noop() {
        let dir = TempDir::new("subgrapher-fs").unwrap();
        let to = dir.path().join("futures/FuturesMarketManager");
        assert!(!FsHandler::relocate_dir(&dir.path().join("missing"), &to).unwrap());
        assert!(!to.exists());
    }

    #[test]
    fn test_package_version() {
        let dir = TempDir::new("subgrapher-fs").unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{ "name": "synthetix", "version": "2.91.0" }"#).unwrap();

        assert_eq!(FsHandler::package_version(&path).as_deref(), Some("2.91.0"));
        assert_eq!(FsHandler::package_version(&dir.path().join("absent.json")), None);
    }
}
