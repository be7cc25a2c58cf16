use std::{
    collections::BTreeSet,
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use cadence_common::{CampaignId, RateConfig, RateState, internal};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{SerializationError, StoreError, ValidationError, store::CampaignStore};

const CONFIG_SUFFIX: &str = "_config.json";
const STATE_SUFFIX: &str = "_state.json";
const TEMP_PREFIX: &str = ".tmp_";

/// File-based backing store implementation
///
/// Each campaign is stored as two pretty-printed JSON files in one directory:
/// - `{campaign}_config.json` - the campaign's [`RateConfig`]
/// - `{campaign}_state.json` - the campaign's [`RateState`]
///
/// Campaign identifiers are validated by [`CampaignId`], so they can be used
/// as file name stems without escaping the directory.
///
/// # Atomicity
/// Every write goes to `.tmp_{file}` first and is then renamed over the
/// target, so a crash mid-write leaves the previous record intact. Stale
/// temporary files are removed by [`FileStore::init`].
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/cadence"),
        }
    }
}

// Custom Deserialize implementation with path validation
impl<'de> Deserialize<'de> for FileStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FileStoreHelper {
            path: PathBuf,
        }

        let helper = FileStoreHelper::deserialize(deserializer)?;
        Self::validate_path(&helper.path).map_err(serde::de::Error::custom)?;

        Ok(Self { path: helper.path })
    }
}

impl FileStore {
    /// Validate a store path
    ///
    /// # Security Checks
    /// - Rejects paths containing `..` (directory traversal)
    /// - Rejects relative paths
    /// - Rejects paths to sensitive system directories
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming the failed check
    fn validate_path(path: &Path) -> Result<(), ValidationError> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ValidationError::ParentDir(path.display().to_string()));
        }

        if !path.is_absolute() {
            return Err(ValidationError::NotAbsolute(path.display().to_string()));
        }

        let sensitive_prefixes = [
            "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
        ];

        if let Some(prefix) = sensitive_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix))
        {
            return Err(ValidationError::SystemDirectory {
                prefix: (*prefix).to_string(),
                path: path.display().to_string(),
            });
        }

        Ok(())
    }

    /// Create a new `FileStore` builder
    #[must_use]
    pub fn builder() -> FileStoreBuilder {
        FileStoreBuilder::default()
    }

    /// The directory holding the campaign records
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepare the store directory
    ///
    /// Creates the directory if it doesn't exist, rejects a path that is not
    /// a directory, and removes temporary files left behind by a crash.
    ///
    /// # Errors
    /// - If the directory cannot be created or read
    /// - If the path exists but is not a directory
    pub fn init(&self) -> crate::Result<()> {
        internal!("Initialising campaign store ...");

        if !self.path.try_exists()? {
            internal!("{} does not exist, creating...", self.path.display());
            fs::create_dir_all(&self.path)?;
        } else if !self.path.is_dir() {
            return Err(ValidationError::NotDirectory(self.path.display().to_string()).into());
        }

        self.cleanup_temp_files()
    }

    fn cleanup_temp_files(&self) -> crate::Result<()> {
        let mut cleaned = 0;

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                fs::remove_file(entry.path())?;
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            internal!(
                level = INFO,
                "Cleaned up {cleaned} orphaned temporary files from campaign store"
            );
        }

        Ok(())
    }

    fn record_path(&self, id: &CampaignId, suffix: &str) -> PathBuf {
        self.path.join(format!("{id}{suffix}"))
    }

    fn read_record<T: DeserializeOwned>(path: &Path) -> crate::Result<Option<T>> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| {
                SerializationError::Corrupted {
                    path: path.to_path_buf(),
                    source,
                }
                .into()
            })
    }

    fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> crate::Result<()> {
        let encoded = serde_json::to_vec_pretty(record).map_err(SerializationError::Encode)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| StoreError::Internal(format!("No file name in {}", path.display())))?;
        let temp_path = self
            .path
            .join(format!("{TEMP_PREFIX}{}", file_name.to_string_lossy()));

        fs::write(&temp_path, encoded)?;
        fs::rename(&temp_path, path)?;

        internal!(level = DEBUG, "Wrote {}", path.display());

        Ok(())
    }
}

impl CampaignStore for FileStore {
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    fn load_config(&self, id: &CampaignId) -> crate::Result<Option<RateConfig>> {
        Self::read_record(&self.record_path(id, CONFIG_SUFFIX))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    fn save_config(&self, id: &CampaignId, config: &RateConfig) -> crate::Result<()> {
        self.write_record(&self.record_path(id, CONFIG_SUFFIX), config)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    fn load_state(&self, id: &CampaignId) -> crate::Result<Option<RateState>> {
        Self::read_record(&self.record_path(id, STATE_SUFFIX))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    fn save_state(&self, id: &CampaignId, state: &RateState) -> crate::Result<()> {
        self.write_record(&self.record_path(id, STATE_SUFFIX), state)
    }

    /// Scan the directory for record files
    ///
    /// Temporary files and names that are not valid campaign identifiers are
    /// skipped.
    #[tracing::instrument(level = "debug", skip_all)]
    fn list(&self) -> crate::Result<Vec<CampaignId>> {
        let mut ids = BTreeSet::new();

        for entry in fs::read_dir(&self.path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(TEMP_PREFIX) {
                continue;
            }

            if let Some(stem) = file_name
                .strip_suffix(CONFIG_SUFFIX)
                .or_else(|| file_name.strip_suffix(STATE_SUFFIX))
                && let Ok(id) = CampaignId::new(stem)
            {
                ids.insert(id);
            }
        }

        internal!(level = DEBUG, "Found {} campaigns in store", ids.len());

        Ok(ids.into_iter().collect())
    }
}

/// Builder for `FileStore`
#[derive(Debug, Default)]
pub struct FileStoreBuilder {
    path: PathBuf,
}

impl FileStoreBuilder {
    /// Set the store directory path
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Build the final `FileStore`
    ///
    /// # Errors
    /// Returns an error if the path is invalid or potentially dangerous
    pub fn build(self) -> crate::Result<FileStore> {
        FileStore::validate_path(&self.path)?;
        Ok(FileStore { path: self.path })
    }
}
