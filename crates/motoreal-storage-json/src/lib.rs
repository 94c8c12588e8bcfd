use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use motoreal_core::{
    storage::{KeyValueStore, StoreKey},
    CoreError,
};
use motoreal_domain::Snapshot;

const JSON_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "snapshot";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by the JSON persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// Standard `data/` and `backups/` layout below an application home.
    pub fn under(home: &Path) -> Self {
        Self {
            data_root: home.join("data"),
            backup_root: home.join("backups"),
        }
    }
}

/// Key-value store writing each collection to `<data_root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn key_path(&self, key: StoreKey) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", key.as_str(), JSON_EXTENSION))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: StoreKey) -> Result<Option<String>, CoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&self, key: StoreKey, json: &str) -> Result<(), CoreError> {
        replace_file(&self.key_path(key), json)
    }

    fn remove(&self, key: StoreKey) -> Result<(), CoreError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Describes a snapshot backup on disk.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Timestamped full-snapshot backups with bounded retention.
#[derive(Debug, Clone)]
pub struct SnapshotBackups {
    backups_dir: PathBuf,
    retention: usize,
}

impl SnapshotBackups {
    pub fn new(backups_dir: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(backups_dir: PathBuf, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn create(&self, snapshot: &Snapshot, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let note = sanitize_backup_note(note);
        let mut stem = format!("{BACKUP_PREFIX}_{timestamp}");
        if let Some(label) = note.as_deref() {
            stem.push('_');
            stem.push_str(label);
        }
        let mut path = self.backups_dir.join(format!("{stem}.{JSON_EXTENSION}"));
        let mut attempt = 2;
        while path.exists() {
            path = self
                .backups_dir
                .join(format!("{stem}-{attempt}.{JSON_EXTENSION}"));
            attempt += 1;
        }

        replace_file(&path, &serialize_snapshot(snapshot)?)?;
        self.prune()?;
        let info = describe(&path).ok_or_else(|| {
            CoreError::Storage(format!("backup {} was not written", path.display()))
        })?;
        tracing::info!(backup = %info.id, "snapshot backup created");
        Ok(info)
    }

    /// Backups ordered newest first.
    pub fn list(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION)
            {
                continue;
            }
            if let Some(info) = describe(&path) {
                entries.push(info);
            }
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.id.clone())));
        Ok(entries)
    }

    /// Finds a backup by file name, stem, or 1-based position in [`Self::list`].
    pub fn find(&self, reference: &str) -> Result<BackupInfo, CoreError> {
        let reference = reference.trim();
        let backups = self.list()?;
        if let Ok(position) = reference.parse::<usize>() {
            if let Some(info) = position.checked_sub(1).and_then(|idx| backups.get(idx)) {
                return Ok(info.clone());
            }
        }
        backups
            .into_iter()
            .find(|info| {
                info.id == reference
                    || info.id.strip_suffix(&format!(".{JSON_EXTENSION}")) == Some(reference)
            })
            .ok_or_else(|| CoreError::Storage(format!("backup `{reference}` not found")))
    }

    pub fn load(&self, backup: &BackupInfo) -> Result<Snapshot, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let data = fs::read_to_string(&backup.path)?;
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(format!("{}: {err}", backup.id)))
    }

    fn prune(&self) -> Result<(), CoreError> {
        for entry in self.list()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(backup = %entry.id, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

fn describe(path: &Path) -> Option<BackupInfo> {
    let id = path.file_name()?.to_str()?.to_string();
    let (created_at, note) = parse_backup_name(&id)?;
    let size_bytes = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    Some(BackupInfo {
        id,
        created_at,
        note,
        size_bytes,
        path: path.to_path_buf(),
    })
}

/// Splits `snapshot_<date>_<time>[_note].json` into its timestamp and note.
fn parse_backup_name(name: &str) -> Option<(Option<DateTime<Utc>>, Option<String>)> {
    let stem = name.strip_suffix(&format!(".{JSON_EXTENSION}"))?;
    let rest = stem.strip_prefix(&format!("{BACKUP_PREFIX}_"))?;
    let mut segments = rest.splitn(3, '_');
    let date = segments.next()?;
    let time = segments.next()?;
    let note = segments.next().map(str::to_string);

    let time_digits = time.get(..6).unwrap_or(time);
    let created_at = if is_digits(date, 8) && is_digits(time_digits, 6) {
        NaiveDateTime::parse_from_str(&format!("{date}{time_digits}"), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    } else {
        None
    };
    Some((created_at, note))
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes to a sibling tmp file, then renames it over `path`.
fn replace_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn serialize_snapshot(snapshot: &Snapshot) -> Result<String, CoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backup_names_with_notes() {
        let (created, note) = parse_backup_name("snapshot_20250314_093015_before-reset.json").unwrap();
        assert_eq!(
            created.unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2025-03-14 09:30:15"
        );
        assert_eq!(note.as_deref(), Some("before-reset"));

        let (created, note) = parse_backup_name("snapshot_20250314_093015-2.json").unwrap();
        assert!(created.is_some());
        assert!(note.is_none());

        assert!(parse_backup_name("vehicles.json").is_none());
    }

    #[test]
    fn sanitizes_notes() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Pull!  ")).as_deref(),
            Some("before-pull")
        );
        assert_eq!(sanitize_backup_note(Some("???")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn tmp_path_keeps_original_extension() {
        assert_eq!(
            tmp_path(Path::new("/data/vehicles.json")),
            PathBuf::from("/data/vehicles.json.tmp")
        );
    }
}
