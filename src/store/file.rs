use super::{PolicyStore, PushMode};
use crate::error::{Result, WafError};
use crate::waf::{ResourceId, WafPolicy};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Policies kept as JSON documents under `<root>/<subscription>/<resource group>/<name>.json`.
///
/// Path components are lower-cased, matching the case-insensitive equality
/// of resource ids.
///
/// Writes always complete before `put_policy` returns, so `PushMode::NoWait`
/// behaves like `PushMode::Wait`.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    root: PathBuf,
}

impl FilePolicyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn policy_path(&self, id: &ResourceId) -> PathBuf {
        self.root
            .join(id.subscription_id.to_lowercase())
            .join(id.resource_group.to_lowercase())
            .join(format!("{}.json", id.name.to_lowercase()))
    }
}

impl PolicyStore for FilePolicyStore {
    fn get_policy(&self, id: &ResourceId) -> Result<Option<WafPolicy>> {
        let path = self.policy_path(id);

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WafError::io(path, e)),
        };

        let policy = serde_json::from_slice(&content).map_err(|e| WafError::Store {
            id: id.to_string(),
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;

        debug!("loaded policy {} from {}", id, path.display());
        Ok(Some(policy))
    }

    fn put_policy(&self, id: &ResourceId, policy: &WafPolicy, mode: PushMode) -> Result<()> {
        let path = self.policy_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WafError::io(parent, e))?;
        }

        let content = serde_json::to_vec_pretty(policy).map_err(|e| WafError::Store {
            id: id.to_string(),
            message: format!("failed to serialize policy: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| WafError::io(&path, e))?;

        info!("updated policy {} ({:?})", id, mode);
        Ok(())
    }

    fn list_policies(&self, subscription_id: &str, max: usize) -> Result<Vec<ResourceId>> {
        let base = self.root.join(subscription_id.to_lowercase());
        if max == 0 || !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let entries = WalkDir::new(&base)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| WafError::io(&base, e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            let resource_group = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str());
            let name = path.file_stem().and_then(|n| n.to_str());

            if let (Some(resource_group), Some(name)) = (resource_group, name) {
                ids.push(ResourceId::policy(subscription_id, resource_group, name));
            }

            if ids.len() == max {
                break;
            }
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waf::{Action, CustomRule};
    use tempfile::tempdir;

    #[test]
    fn test_missing_policy_is_none() {
        let dir = tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        let id = ResourceId::policy("sub", "rg", "pol");
        assert!(store.get_policy(&id).unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        let id = ResourceId::policy("sub", "rg", "pol");

        let mut policy = WafPolicy::named("pol");
        policy.set_custom_rules(vec![CustomRule::ip_match(
            "BlockNets5000".to_string(),
            5000,
            Action::Block,
            vec!["1.2.3.4/32".to_string()],
        )]);

        store.put_policy(&id, &policy, PushMode::Wait).unwrap();
        assert!(dir.path().join("sub/rg/pol.json").exists());
        assert_eq!(store.get_policy(&id).unwrap(), Some(policy));
    }

    #[test]
    fn test_lookup_ignores_case() {
        let dir = tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        let stored = ResourceId::policy("Sub", "MyGroup", "Edge");
        store.put_policy(&stored, &WafPolicy::named("Edge"), PushMode::Wait).unwrap();

        let lookup = ResourceId::policy("sub", "mygroup", "EDGE");
        assert_eq!(store.get_policy(&lookup).unwrap(), Some(WafPolicy::named("Edge")));
        assert_eq!(store.list_policies("SUB", 10).unwrap(), vec![lookup]);
    }

    #[test]
    fn test_corrupt_document_is_store_error() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/rg")).unwrap();
        std::fs::write(dir.path().join("sub/rg/pol.json"), "{ nope").unwrap();

        let store = FilePolicyStore::new(dir.path());
        let result = store.get_policy(&ResourceId::policy("sub", "rg", "pol"));
        assert!(matches!(result, Err(WafError::Store { .. })));
    }

    #[test]
    fn test_list_policies() {
        let dir = tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        for (rg, name) in [("rg1", "a"), ("rg1", "b"), ("rg2", "c")] {
            store
                .put_policy(&ResourceId::policy("sub", rg, name), &WafPolicy::named(name), PushMode::Wait)
                .unwrap();
        }
        std::fs::write(dir.path().join("sub/rg1/notes.txt"), "ignored").unwrap();

        let ids = store.list_policies("sub", 10).unwrap();
        let names: Vec<&str> = ids.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert_eq!(store.list_policies("sub", 1).unwrap().len(), 1);
        assert!(store.list_policies("other", 10).unwrap().is_empty());
    }
}
