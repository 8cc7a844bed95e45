//! Policy backups on disk.
//!
//! Each backup is one pretty-printed [`WrappedPolicy`] JSON document named
//! `<subscription>+<resourceGroup>+<name>+<YYYYMMDDhhmmss>.json`.

use crate::error::{Result, WafError};
use crate::store::{PolicyStore, MAX_POLICIES_TO_FETCH};
use crate::waf::{ResourceId, WrappedPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Subscription to back up when no explicit ids are given
    pub subscription_id: String,
    pub ids: Vec<ResourceId>,
    pub dir: PathBuf,
    pub fail_fast: bool,
}

#[derive(Debug, Default)]
pub struct BackupReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, WafError)>,
}

/// Back up the requested policies into `options.dir`.
///
/// Without explicit ids every policy in the subscription is backed up, up to
/// [`MAX_POLICIES_TO_FETCH`]. In fail-fast mode the first failure is returned;
/// otherwise failures are collected in the report.
pub fn backup_policies<S: PolicyStore>(store: &S, options: &BackupOptions) -> Result<BackupReport> {
    if options.ids.is_empty() && options.subscription_id.is_empty() {
        return Err(WafError::InvalidScope(
            "either subscription id or resource ids are required".to_string(),
        ));
    }

    let ids = if options.ids.is_empty() {
        store.list_policies(&options.subscription_id, MAX_POLICIES_TO_FETCH)?
    } else {
        options.ids.clone()
    };
    debug!("backing up {} policies", ids.len());

    let mut report = BackupReport::default();

    for id in &ids {
        let result = store
            .get_policy(id)
            .and_then(|policy| policy.ok_or_else(|| WafError::TargetNotFound(id.to_string())))
            .and_then(|policy| write_backup(&options.dir, &WrappedPolicy::new(id, policy)));

        match result {
            Ok(path) => report.written.push(path),
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                error!("failed to back up {}: {}", id, e);
                report.failed.push((id.to_string(), e));
            }
        }
    }

    Ok(report)
}

/// Write one backup into `dir`, returning the path written.
pub fn write_backup(dir: &Path, policy: &WrappedPolicy) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| WafError::io(dir, e))?;

    let path = dir.join(policy.file_name());
    let content = serde_json::to_vec_pretty(policy).map_err(|e| WafError::InvalidBackup {
        path: path.clone(),
        message: e.to_string(),
    })?;

    fs::write(&path, content).map_err(|e| WafError::io(&path, e))?;
    info!("backup written to: {}", path.display());

    Ok(path)
}

/// Load backups from files or directories.
///
/// Only files ending in `.json` (any case) are read; directories are not
/// descended into.
pub fn load_backups<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<WrappedPolicy>> {
    let mut backups = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| WafError::io(path, e))?;

        if !metadata.is_dir() {
            if is_json(path) {
                backups.push(load_backup(path)?);
            }
            continue;
        }

        for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| WafError::io(path, e.into()))?;
            if entry.file_type().is_file() && is_json(entry.path()) {
                backups.push(load_backup(entry.path())?);
            }
        }
    }

    debug!("loaded {} policy backups", backups.len());
    Ok(backups)
}

pub fn load_backup(path: &Path) -> Result<WrappedPolicy> {
    let content = fs::read(path).map_err(|e| WafError::io(path, e))?;
    serde_json::from_slice(&content).map_err(|e| WafError::InvalidBackup {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPolicyStore;
    use crate::waf::WafPolicy;
    use tempfile::tempdir;

    fn seeded() -> MemoryPolicyStore {
        let store = MemoryPolicyStore::new();
        for name in ["one", "two"] {
            store.insert(ResourceId::policy("sub", "rg", name), WafPolicy::named(name));
        }
        store
    }

    #[test]
    fn test_backup_whole_subscription() {
        let dir = tempdir().unwrap();
        let store = seeded();
        let options = BackupOptions {
            subscription_id: "sub".to_string(),
            dir: dir.path().to_path_buf(),
            ..BackupOptions::default()
        };

        let report = backup_policies(&store, &options).unwrap();
        assert_eq!(report.written.len(), 2);
        assert!(report.failed.is_empty());

        let name = report.written[0].file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("sub+rg+one+"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "sub+rg+one+".len() + 14 + ".json".len());
    }

    #[test]
    fn test_backup_requires_scope() {
        let store = seeded();
        let err = backup_policies(&store, &BackupOptions::default()).unwrap_err();
        assert!(matches!(err, WafError::InvalidScope(_)));
    }

    #[test]
    fn test_missing_id_respects_fail_fast() {
        let dir = tempdir().unwrap();
        let store = seeded();
        let mut options = BackupOptions {
            ids: vec![
                ResourceId::policy("sub", "rg", "missing"),
                ResourceId::policy("sub", "rg", "one"),
            ],
            dir: dir.path().to_path_buf(),
            ..BackupOptions::default()
        };

        let report = backup_policies(&store, &options).unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(matches!(report.failed[0].1, WafError::TargetNotFound(_)));

        options.fail_fast = true;
        assert!(backup_policies(&store, &options).is_err());
    }

    #[test]
    fn test_written_backups_load_back() {
        let dir = tempdir().unwrap();
        let id = ResourceId::policy("sub", "rg", "pol");
        let wrapped = WrappedPolicy::new(&id, WafPolicy::named("pol"));

        let path = write_backup(dir.path(), &wrapped).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a backup").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let from_dir = load_backups(&[dir.path()]).unwrap();
        assert_eq!(from_dir, vec![wrapped.clone()]);

        let from_file = load_backups(&[path]).unwrap();
        assert_eq!(from_file[0].policy_id, id.to_string());
    }

    #[test]
    fn test_extension_match_ignores_case() {
        let dir = tempdir().unwrap();
        let wrapped = WrappedPolicy::new(&ResourceId::policy("sub", "rg", "pol"), WafPolicy::named("pol"));
        let path = dir.path().join("UPPER.JSON");
        fs::write(&path, serde_json::to_vec(&wrapped).unwrap()).unwrap();

        assert_eq!(load_backups(&[dir.path()]).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_backup_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{}").unwrap();

        let err = load_backups(&[&path]).unwrap_err();
        assert!(matches!(err, WafError::InvalidBackup { .. }));

        let err = load_backups(&[dir.path().join("absent.json")]).unwrap_err();
        assert!(matches!(err, WafError::Io { .. }));
    }
}
