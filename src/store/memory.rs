use super::{PolicyStore, PushMode};
use crate::error::Result;
use crate::waf::{ResourceId, WafPolicy};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory policy store, keyed by lower-cased resource id.
#[derive(Clone, Default)]
pub struct MemoryPolicyStore {
    policies: Arc<RwLock<BTreeMap<String, (ResourceId, WafPolicy)>>>,
    pushes: Arc<RwLock<Vec<(ResourceId, PushMode)>>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a policy without recording a push.
    pub fn insert(&self, id: ResourceId, policy: WafPolicy) {
        let mut policies = self.policies.write();
        policies.insert(id.as_str().to_lowercase(), (id, policy));
    }

    /// Every push made so far, in order.
    pub fn pushes(&self) -> Vec<(ResourceId, PushMode)> {
        self.pushes.read().clone()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn get_policy(&self, id: &ResourceId) -> Result<Option<WafPolicy>> {
        let policies = self.policies.read();
        Ok(policies
            .get(&id.as_str().to_lowercase())
            .map(|(_, policy)| policy.clone()))
    }

    fn put_policy(&self, id: &ResourceId, policy: &WafPolicy, mode: PushMode) -> Result<()> {
        self.insert(id.clone(), policy.clone());
        self.pushes.write().push((id.clone(), mode));
        Ok(())
    }

    fn list_policies(&self, subscription_id: &str, max: usize) -> Result<Vec<ResourceId>> {
        let policies = self.policies.read();
        Ok(policies
            .values()
            .filter(|(id, _)| id.subscription_id.eq_ignore_ascii_case(subscription_id))
            .map(|(id, _)| id.clone())
            .take(max)
            .collect())
    }
}
