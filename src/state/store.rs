//! ProjectStore - file-backed persistence for the quality workflow
//!
//! One YAML document per entity under `<project>/siteqa/`:
//! - `lots/<id>.yaml` — lot with its embedded work instance, snapshot and
//!   completions (the snapshot is self-contained so it survives template
//!   edits and deletion)
//! - `templates/<id>.yaml` — live, editable checklist templates
//! - `holdpoints/<id>.yaml` — hold point tracking records
//! - `tokens/pending/<digest>.yaml`, `tokens/used/<digest>.yaml` — release
//!   tokens, filed under the digest of their secret
//! - `notifications/<id>.yaml` — dispatched internal notifications
//! - `test_results/<lot>.yaml`, `ncrs/<lot>.yaml` — collaborator inputs
//!
//! Writes are atomic (temp file + persist). Lots and hold points carry an
//! `updated_at` stamp compared at write time; a mismatch means another
//! writer got there first. Token consumption is a rename from `pending/`
//! to `used/` so the
//! used check and the used set happen in one filesystem operation.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::models::{
    ChecklistTemplate, HoldPoint, Lot, NcrRecord, Notification, ReleaseTokenRecord,
    TestResultRecord,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Concurrent update detected for {0}; reload and retry")]
    Conflict(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Whether a token record lives in the pending or the used set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Pending,
    Used,
}

/// File-backed store for one project
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Open a store rooted at the project directory. Does not create
    /// anything; call [`ProjectStore::init`] to scaffold.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: project_root.into(),
        }
    }

    /// Project root this store was opened at
    pub fn project_root(&self) -> &Path {
        &self.root
    }

    fn data_dir(&self) -> PathBuf {
        self.root.join("siteqa")
    }

    /// Whether the project has been initialized
    pub fn is_initialized(&self) -> bool {
        self.data_dir().is_dir()
    }

    /// Create the data directory layout
    pub fn init(&self) -> StoreResult<()> {
        for sub in [
            "templates",
            "lots",
            "holdpoints",
            "tokens/pending",
            "tokens/used",
            "notifications",
            "test_results",
            "ncrs",
        ] {
            fs::create_dir_all(self.data_dir().join(sub))?;
        }
        Ok(())
    }

    // =========================================================================
    // Templates
    // =========================================================================

    pub fn save_template(&self, template: &ChecklistTemplate) -> StoreResult<()> {
        let path = self.data_dir().join("templates").join(format!("{}.yaml", template.id));
        write_yaml(&path, template)
    }

    pub fn load_template(&self, template_id: &str) -> StoreResult<ChecklistTemplate> {
        let path = self.data_dir().join("templates").join(format!("{}.yaml", template_id));
        read_yaml(&path, || format!("Template '{}'", template_id))
    }

    pub fn list_templates(&self) -> StoreResult<Vec<ChecklistTemplate>> {
        read_dir_yaml(&self.data_dir().join("templates"))
    }

    // =========================================================================
    // Lots
    // =========================================================================

    pub fn load_lot(&self, lot_id: &str) -> StoreResult<Lot> {
        let path = self.lot_path(lot_id);
        read_yaml(&path, || format!("Lot '{}'", lot_id))
    }

    /// Resolve a lot by id or by its human lot number
    pub fn find_lot(&self, key: &str) -> StoreResult<Lot> {
        if self.lot_path(key).exists() {
            return self.load_lot(key);
        }
        self.list_lots()?
            .into_iter()
            .find(|l| l.number == key)
            .ok_or_else(|| StoreError::NotFound(format!("Lot '{}'", key)))
    }

    pub fn list_lots(&self) -> StoreResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = read_dir_yaml(&self.data_dir().join("lots"))?;
        lots.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(lots)
    }

    /// Persist a lot. Detects lost updates by comparing the on-disk
    /// `updated_at` stamp with the stamp the document was loaded with, then
    /// advances the stamp.
    pub fn save_lot(&self, lot: &mut Lot) -> StoreResult<()> {
        let path = self.lot_path(&lot.id);
        if path.exists() {
            let current: Lot = read_yaml(&path, || format!("Lot '{}'", lot.id))?;
            if current.updated_at != lot.updated_at {
                return Err(StoreError::Conflict(format!("lot '{}'", lot.number)));
            }
        }
        lot.updated_at = chrono::Utc::now();
        write_yaml(&path, lot)
    }

    fn lot_path(&self, lot_id: &str) -> PathBuf {
        self.data_dir().join("lots").join(format!("{}.yaml", lot_id))
    }

    // =========================================================================
    // Hold points
    // =========================================================================

    /// Persist a hold point with the same lost-update detection as
    /// [`ProjectStore::save_lot`]: the on-disk `updated_at` stamp must
    /// match the stamp the document was loaded with.
    pub fn save_hold_point(&self, point: &mut HoldPoint) -> StoreResult<()> {
        let path = self.data_dir().join("holdpoints").join(format!("{}.yaml", point.id));
        if path.exists() {
            let current: HoldPoint = read_yaml(&path, || format!("Hold point '{}'", point.id))?;
            if current.updated_at != point.updated_at {
                return Err(StoreError::Conflict(format!("hold point '{}'", point.id)));
            }
        }
        point.updated_at = chrono::Utc::now();
        write_yaml(&path, point)
    }

    pub fn load_hold_point(&self, point_id: &str) -> StoreResult<HoldPoint> {
        let path = self.data_dir().join("holdpoints").join(format!("{}.yaml", point_id));
        read_yaml(&path, || format!("Hold point '{}'", point_id))
    }

    /// Find the tracking record for one checklist item on one lot
    pub fn find_hold_point(&self, lot_id: &str, item_id: &str) -> StoreResult<Option<HoldPoint>> {
        Ok(self
            .list_hold_points()?
            .into_iter()
            .find(|p| p.lot_id == lot_id && p.item_id == item_id))
    }

    pub fn list_hold_points(&self) -> StoreResult<Vec<HoldPoint>> {
        read_dir_yaml(&self.data_dir().join("holdpoints"))
    }

    // =========================================================================
    // Release tokens
    // =========================================================================

    pub fn save_pending_token(&self, record: &ReleaseTokenRecord) -> StoreResult<()> {
        let path = self.pending_token_path(&record.digest);
        write_yaml(&path, record)
    }

    /// Look a token up by digest without touching it
    pub fn token_status(&self, digest: &str) -> StoreResult<Option<(ReleaseTokenRecord, TokenState)>> {
        let pending = self.pending_token_path(digest);
        if pending.exists() {
            let record = read_yaml(&pending, || format!("Token '{}'", digest))?;
            return Ok(Some((record, TokenState::Pending)));
        }
        let used = self.used_token_path(digest);
        if used.exists() {
            let record = read_yaml(&used, || format!("Token '{}'", digest))?;
            return Ok(Some((record, TokenState::Used)));
        }
        Ok(None)
    }

    /// Atomically move a token from pending to used. The rename is the
    /// "already used" check and set in one operation: exactly one caller
    /// can win, any replay finds the pending file gone.
    pub fn consume_token(&self, digest: &str) -> StoreResult<ReleaseTokenRecord> {
        let pending = self.pending_token_path(digest);
        let used = self.used_token_path(digest);
        fs::rename(&pending, &used).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(format!("Pending token '{}'", digest))
            } else {
                StoreError::Io(e)
            }
        })?;
        read_yaml(&used, || format!("Token '{}'", digest))
    }

    /// Rewrite a consumed token with its use attribution
    pub fn save_used_token(&self, record: &ReleaseTokenRecord) -> StoreResult<()> {
        let path = self.used_token_path(&record.digest);
        write_yaml(&path, record)
    }

    fn pending_token_path(&self, digest: &str) -> PathBuf {
        self.data_dir().join("tokens/pending").join(format!("{}.yaml", digest))
    }

    fn used_token_path(&self, digest: &str) -> PathBuf {
        self.data_dir().join("tokens/used").join(format!("{}.yaml", digest))
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn save_notification(&self, notification: &Notification) -> StoreResult<()> {
        let path = self
            .data_dir()
            .join("notifications")
            .join(format!("{}.yaml", notification.id));
        write_yaml(&path, notification)
    }

    pub fn list_notifications(&self) -> StoreResult<Vec<Notification>> {
        read_dir_yaml(&self.data_dir().join("notifications"))
    }

    /// Whether an unconsumed notification already references this entity;
    /// used to suppress duplicate witness-point notices
    pub fn has_unconsumed_reference(&self, reference: &str) -> StoreResult<bool> {
        Ok(self
            .list_notifications()?
            .iter()
            .any(|n| !n.consumed && n.reference.as_deref() == Some(reference)))
    }

    // =========================================================================
    // Collaborator inputs (read-mostly)
    // =========================================================================

    pub fn load_test_results(&self, lot_id: &str) -> StoreResult<Vec<TestResultRecord>> {
        read_yaml_or_default(&self.data_dir().join("test_results").join(format!("{}.yaml", lot_id)))
    }

    pub fn save_test_results(&self, lot_id: &str, results: &[TestResultRecord]) -> StoreResult<()> {
        let path = self.data_dir().join("test_results").join(format!("{}.yaml", lot_id));
        write_yaml(&path, &results.to_vec())
    }

    pub fn load_ncrs(&self, lot_id: &str) -> StoreResult<Vec<NcrRecord>> {
        read_yaml_or_default(&self.data_dir().join("ncrs").join(format!("{}.yaml", lot_id)))
    }

    pub fn save_ncrs(&self, lot_id: &str, ncrs: &[NcrRecord]) -> StoreResult<()> {
        let path = self.data_dir().join("ncrs").join(format!("{}.yaml", lot_id));
        write_yaml(&path, &ncrs.to_vec())
    }

    /// User id -> display name map from `siteqa/users.yaml`
    pub fn load_users(&self) -> StoreResult<HashMap<String, String>> {
        read_yaml_or_default(&self.data_dir().join("users.yaml"))
    }
}

// =============================================================================
// YAML document helpers
// =============================================================================

/// Atomic write: temp file in the target directory, then persist
fn write_yaml<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::InvalidPath(path.display().to_string()))?;
    fs::create_dir_all(parent)?;

    let content = serde_yaml::to_string(value)?;
    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    temp_file
        .persist(path)
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn read_yaml<T: DeserializeOwned>(path: &Path, describe: impl Fn() -> String) -> StoreResult<T> {
    if !path.exists() {
        return Err(StoreError::NotFound(describe()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

fn read_yaml_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Read every `.yaml` document in a directory; missing directory is empty
fn read_dir_yaml<T: DeserializeOwned>(dir: &Path) -> StoreResult<Vec<T>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "yaml") {
            let content = fs::read_to_string(&path)?;
            out.push(serde_yaml::from_str(&content)?);
        }
    }
    Ok(out)
}
