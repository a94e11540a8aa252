//! Project layout on disk.

use std::path::{Path, PathBuf};

use subgrapher_manifest::{
    FileDeploymentRecords, ManifestVariant, NetworkId, SchemaDocument, SchemaError,
};

use crate::config::PathsConfig;

/// Resolves the configured paths against a project root.
///
/// `relative_*` paths are what the external tools get, since they run from
/// the project root. The others are for reading and writing files here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    paths: PathsConfig,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root: root.into(),
            paths,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subgraphs_dir(&self) -> PathBuf {
        self.root.join(&self.paths.subgraphs)
    }

    /// The merged schema every manifest references.
    pub fn main_schema(&self) -> PathBuf {
        ManifestVariant::Main.schema_path(&self.subgraphs_dir())
    }

    pub fn generated_dir(&self, variant: ManifestVariant) -> PathBuf {
        self.root.join(self.relative_generated_dir(variant))
    }

    pub fn relative_generated_dir(&self, variant: ManifestVariant) -> PathBuf {
        self.paths.generated.join(variant.to_string())
    }

    pub fn relative_build_dir(&self, network: NetworkId, variant: ManifestVariant) -> PathBuf {
        self.paths
            .build
            .join(network.to_string())
            .join("subgraphs")
            .join(variant.to_string())
    }

    pub fn relative_manifest(&self, variant: ManifestVariant, network: NetworkId) -> PathBuf {
        variant.manifest_path(&self.paths.subgraphs, network)
    }

    pub fn deployment_records(&self) -> FileDeploymentRecords {
        FileDeploymentRecords::new(self.root.join(&self.paths.deployments))
    }

    /// Merge the per-family schemas and write the main schema.
    pub fn merge_schemas(&self) -> Result<SchemaDocument, SchemaError> {
        let subgraphs = self.subgraphs_dir();
        let schema = SchemaDocument::merge_files(
            ManifestVariant::families().map(|variant| variant.schema_path(&subgraphs)),
        )?;

        let path = self.main_schema();
        let digest = schema.write_to(&path)?;
        tracing::info!(
            path = %path.display(),
            definitions = schema.names().len(),
            digest = %digest,
            "Main schema generated"
        );

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use subgrapher_manifest::AUTOGEN_NOTICE;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_paths_follow_config() {
        let layout = ProjectLayout::new("/project", PathsConfig::default());

        assert_eq!(layout.main_schema(), PathBuf::from("/project/subgraphs/main.graphql"));
        assert_eq!(
            layout.generated_dir(ManifestVariant::Perps),
            PathBuf::from("/project/generated/subgraphs/perps")
        );
        assert_eq!(
            layout.relative_build_dir(NetworkId::OptimismGoerli, ManifestVariant::Main),
            PathBuf::from("build/optimism-goerli/subgraphs/main")
        );
        assert_eq!(
            layout.relative_manifest(ManifestVariant::Futures, NetworkId::Optimism),
            PathBuf::from("subgraphs/futures.optimism.yaml")
        );
    }

    #[test]
    fn test_merge_schemas_writes_main() {
        let dir = TempDir::new("subgrapher-layout").unwrap();
        let layout = ProjectLayout::new(dir.path(), PathsConfig::default());
        std::fs::create_dir_all(layout.subgraphs_dir()).unwrap();
        let shared = "type FuturesMarket @entity { id: ID! asset: Bytes! }";
        std::fs::write(
            layout.subgraphs_dir().join("futures.graphql"),
            format!("{shared}\ntype FuturesTrade @entity {{ id: ID! }}"),
        )
        .unwrap();
        std::fs::write(layout.subgraphs_dir().join("perps.graphql"), shared).unwrap();

        let schema = layout.merge_schemas().unwrap();

        assert_eq!(schema.names(), ["FuturesMarket", "FuturesTrade"]);
        let written = std::fs::read_to_string(layout.main_schema()).unwrap();
        assert!(written.starts_with(AUTOGEN_NOTICE));
    }
}
