//! Filesystem adapter: Implementation of ArtifactStore.
//!
//! Artifacts are JSON files in one directory, bound by `manifest.json`
//! which records the SHA-256 of each file.
//!
//! # Atomicity
//!
//! `save` writes a complete set into a fresh staging directory next to the
//! target (manifest last) and promotes it with a directory rename. The
//! previous set is moved aside to a `.{name}.previous-*` sibling first and
//! deleted only after promotion; a failed promotion moves it back.
//!
//! A crash between the two renames leaves no artifact directory, only the
//! backup. `load` restores the newest such backup before reading.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{
    ArtifactError, ArtifactManifest, ArtifactSet, CategoryCatalog, LogisticModel,
    StandardScaler, ARTIFACT_FILES, CATALOG_FILE, FEATURE_NAMES_FILE, MANIFEST_FILE,
    MANIFEST_VERSION, MODEL_FILE, SCALER_FILE,
};
use crate::ports::ArtifactStore;

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn io_error(path: &Path, source: std::io::Error) -> ArtifactError {
    if source.kind() == ErrorKind::NotFound {
        ArtifactError::Missing(path.to_path_buf())
    } else {
        ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn parse<T: DeserializeOwned>(file: &str, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|e| ArtifactError::Corrupt {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

fn to_json<T: Serialize>(file: &str, value: &T) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Corrupt {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let mut file = File::create(path).map_err(|e| io_error(path, e))?;
    file.write_all(bytes).map_err(|e| io_error(path, e))?;
    file.sync_all().map_err(|e| io_error(path, e))
}

/// Directory-backed artifact store.
pub struct FsArtifactStore {
    dir: PathBuf,
    require_manifest: bool,
}

impl FsArtifactStore {
    /// Create a store for `dir`. A manifest is required by default.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            require_manifest: true,
        }
    }

    /// Allow loading hand-placed artifacts that carry no manifest.
    #[must_use]
    pub fn require_manifest(mut self, required: bool) -> Self {
        self.require_manifest = required;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.dir.join(file);
        fs::read(&path).map_err(|e| io_error(&path, e))
    }

    fn load_manifest(&self) -> Result<Option<ArtifactManifest>, ArtifactError> {
        let bytes = match self.read(MANIFEST_FILE) {
            Ok(bytes) => bytes,
            Err(ArtifactError::Missing(path)) => {
                if self.require_manifest {
                    return Err(ArtifactError::Missing(path));
                }
                tracing::warn!(
                    "No manifest in {:?}; loading artifacts without integrity check",
                    self.dir
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let manifest: ArtifactManifest = parse(MANIFEST_FILE, &bytes)?;
        if manifest.version > MANIFEST_VERSION {
            return Err(ArtifactError::Corrupt {
                file: MANIFEST_FILE.to_string(),
                reason: format!(
                    "unsupported manifest version {} (max {MANIFEST_VERSION})",
                    manifest.version
                ),
            });
        }
        Ok(Some(manifest))
    }

    fn parent(&self) -> &Path {
        self.dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn sibling_prefix(&self, tag: &str) -> String {
        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifacts".to_string());
        format!(".{name}.{tag}-")
    }

    /// Sibling path for staging and backup directories.
    fn sibling(&self, tag: &str) -> PathBuf {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        self.parent().join(format!(
            "{}{}-{nanos}",
            self.sibling_prefix(tag),
            std::process::id()
        ))
    }

    /// Backup directories left by saves, oldest first.
    fn stranded_backups(&self) -> Vec<PathBuf> {
        let prefix = self.sibling_prefix("previous");
        let Ok(entries) = fs::read_dir(self.parent()) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        found.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());
        found
    }

    /// Move the newest backup back into place after an interrupted save.
    fn recover_stranded(&self) -> bool {
        let Some(backup) = self.stranded_backups().pop() else {
            return false;
        };
        match fs::rename(&backup, &self.dir) {
            Ok(()) => {
                tracing::warn!("Restored artifacts from interrupted save at {:?}", backup);
                true
            }
            Err(e) => {
                tracing::error!("Failed to restore artifacts from {:?}: {}", backup, e);
                false
            }
        }
    }

    fn write_staged(&self, staging: &Path, artifacts: &ArtifactSet) -> Result<(), ArtifactError> {
        fs::create_dir_all(staging).map_err(|e| io_error(staging, e))?;

        let contents = [
            (MODEL_FILE, to_json(MODEL_FILE, &artifacts.model)?),
            (SCALER_FILE, to_json(SCALER_FILE, &artifacts.scaler)?),
            (
                FEATURE_NAMES_FILE,
                to_json(FEATURE_NAMES_FILE, &artifacts.feature_names)?,
            ),
            (CATALOG_FILE, to_json(CATALOG_FILE, &artifacts.catalog)?),
        ];

        let mut files = std::collections::BTreeMap::new();
        for (file, bytes) in &contents {
            write_synced(&staging.join(file), bytes)?;
            files.insert((*file).to_string(), sha256_hex_bytes(bytes));
        }

        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            created_at: chrono::Utc::now(),
            feature_count: artifacts.feature_names.len(),
            files,
        };
        write_synced(
            &staging.join(MANIFEST_FILE),
            &to_json(MANIFEST_FILE, &manifest)?,
        )
    }

    fn promote(&self, staging: &Path) -> Result<(), ArtifactError> {
        if !self.dir.exists() {
            return fs::rename(staging, &self.dir).map_err(|e| io_error(&self.dir, e));
        }

        let backup = self.sibling("previous");
        fs::rename(&self.dir, &backup).map_err(|e| io_error(&self.dir, e))?;
        if let Err(e) = fs::rename(staging, &self.dir) {
            if let Err(restore) = fs::rename(&backup, &self.dir) {
                tracing::error!(
                    "Failed to restore previous artifacts from {:?}: {}",
                    backup,
                    restore
                );
            }
            return Err(io_error(&self.dir, e));
        }

        if let Err(e) = fs::remove_dir_all(&backup) {
            tracing::warn!("Failed to remove previous artifacts at {:?}: {}", backup, e);
        }
        Ok(())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self) -> Result<ArtifactSet, ArtifactError> {
        if !self.dir.is_dir() && !self.recover_stranded() {
            return Err(ArtifactError::Missing(self.dir.clone()));
        }

        let manifest = self.load_manifest()?;

        let mut raw = Vec::with_capacity(ARTIFACT_FILES.len());
        for file in ARTIFACT_FILES {
            let bytes = self.read(file)?;
            if let Some(manifest) = &manifest {
                let expected = manifest.files.get(file).ok_or_else(|| ArtifactError::Corrupt {
                    file: MANIFEST_FILE.to_string(),
                    reason: format!("{file} is not listed"),
                })?;
                if !expected.eq_ignore_ascii_case(&sha256_hex_bytes(&bytes)) {
                    return Err(ArtifactError::Integrity {
                        file: file.to_string(),
                    });
                }
            }
            raw.push(bytes);
        }

        let artifacts = ArtifactSet {
            model: parse::<LogisticModel>(MODEL_FILE, &raw[0])?,
            scaler: parse::<StandardScaler>(SCALER_FILE, &raw[1])?,
            feature_names: parse::<Vec<String>>(FEATURE_NAMES_FILE, &raw[2])?,
            catalog: parse::<CategoryCatalog>(CATALOG_FILE, &raw[3])?,
        };
        artifacts.validate()?;

        if let Some(manifest) = &manifest {
            if manifest.feature_count != artifacts.feature_names.len() {
                return Err(ArtifactError::Inconsistent(format!(
                    "manifest declares {} features, found {}",
                    manifest.feature_count,
                    artifacts.feature_names.len()
                )));
            }
        }

        tracing::info!(
            "Loaded artifacts from {:?} (n_features={}, verified={})",
            self.dir,
            artifacts.feature_names.len(),
            manifest.is_some()
        );
        Ok(artifacts)
    }

    fn save(&self, artifacts: &ArtifactSet) -> Result<(), ArtifactError> {
        artifacts.validate()?;

        if let Some(parent) = self.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let staging = self.sibling("staging");
        let result = self
            .write_staged(&staging, artifacts)
            .and_then(|()| self.promote(&staging));

        if result.is_err() && staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                tracing::warn!("Failed to clean staging directory {:?}: {}", staging, e);
            }
        }
        result?;

        tracing::info!(
            "Saved artifacts to {:?} (n_features={})",
            self.dir,
            artifacts.feature_names.len()
        );
        Ok(())
    }

    fn exists(&self) -> bool {
        ARTIFACT_FILES.iter().all(|f| self.dir.join(f).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::loan_catalog;
    use crate::domain::FeatureLayout;
    use tempfile::tempdir;

    fn artifact_set(intercept: f64) -> ArtifactSet {
        let catalog = loan_catalog();
        let layout = FeatureLayout::from_catalog(&catalog).expect("layout");
        let n = layout.len();
        ArtifactSet {
            model: LogisticModel {
                coefficients: (0..n).map(|i| i as f64 / 100.0).collect(),
                intercept,
            },
            scaler: StandardScaler {
                mean: vec![0.5; n],
                var: vec![4.0; n],
                scale: vec![2.0; n],
            },
            feature_names: layout.feature_names().to_vec(),
            catalog,
        }
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        assert!(!store.exists());

        let set = artifact_set(-1.25);
        store.save(&set).expect("save");

        assert!(store.exists());
        assert!(store.dir().join(MANIFEST_FILE).is_file());
        assert_eq!(store.load().expect("load"), set);
    }

    #[test]
    fn test_save_replaces_existing_set_without_leftovers() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));

        store.save(&artifact_set(1.0)).expect("save");
        store.save(&artifact_set(2.0)).expect("save again");

        assert_eq!(store.load().expect("load").model.intercept, 2.0);
        let entries: Vec<_> = fs::read_dir(temp.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_tampered_file_fails_integrity() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        store.save(&artifact_set(0.0)).expect("save");

        let tampered = serde_json::to_vec(&LogisticModel {
            coefficients: vec![0.0; 24],
            intercept: 9.0,
        })
        .expect("serialize");
        fs::write(store.dir().join(MODEL_FILE), tampered).expect("write");

        assert!(matches!(
            store.load(),
            Err(ArtifactError::Integrity { file }) if file == MODEL_FILE
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        store.save(&artifact_set(0.0)).expect("save");
        fs::remove_file(store.dir().join(SCALER_FILE)).expect("remove");

        assert!(!store.exists());
        assert!(matches!(store.load(), Err(ArtifactError::Missing(_))));
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("nowhere"));
        assert!(matches!(store.load(), Err(ArtifactError::Missing(_))));
    }

    #[test]
    fn test_manifest_requirement() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("models");
        FsArtifactStore::new(&dir)
            .save(&artifact_set(0.0))
            .expect("save");
        fs::remove_file(dir.join(MANIFEST_FILE)).expect("remove manifest");

        assert!(matches!(
            FsArtifactStore::new(&dir).load(),
            Err(ArtifactError::Missing(_))
        ));
        assert!(FsArtifactStore::new(&dir)
            .require_manifest(false)
            .load()
            .is_ok());
    }

    #[test]
    fn test_corrupt_json_without_manifest() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("models");
        FsArtifactStore::new(&dir)
            .save(&artifact_set(0.0))
            .expect("save");
        fs::remove_file(dir.join(MANIFEST_FILE)).expect("remove manifest");
        fs::write(dir.join(CATALOG_FILE), b"{not json").expect("write");

        let store = FsArtifactStore::new(&dir).require_manifest(false);
        assert!(matches!(
            store.load(),
            Err(ArtifactError::Corrupt { file, .. }) if file == CATALOG_FILE
        ));
    }

    #[test]
    fn test_inconsistent_set_is_not_written() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        store.save(&artifact_set(3.0)).expect("save");

        let mut broken = artifact_set(4.0);
        broken.scaler.mean.pop();
        assert!(store.save(&broken).is_err());

        assert_eq!(store.load().expect("previous set").model.intercept, 3.0);
    }

    fn previous_siblings(root: &Path) -> Vec<String> {
        fs::read_dir(root)
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".models.previous-"))
            .collect()
    }

    #[test]
    fn test_failed_promotion_restores_previous_set() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        store.save(&artifact_set(1.0)).expect("save");

        assert!(store.promote(&temp.path().join("does-not-exist")).is_err());

        assert_eq!(store.load().expect("previous set").model.intercept, 1.0);
        assert!(previous_siblings(temp.path()).is_empty());
    }

    #[test]
    fn test_interrupted_save_is_recovered_on_load() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        store.save(&artifact_set(5.0)).expect("save");

        // Crash after the old set was moved aside, before staging took its place.
        fs::rename(store.dir(), temp.path().join(".models.previous-1-1")).expect("rename");
        assert!(!store.dir().exists());

        assert_eq!(store.load().expect("recovered").model.intercept, 5.0);
        assert!(store.dir().is_dir());
        assert!(previous_siblings(temp.path()).is_empty());
    }
}
