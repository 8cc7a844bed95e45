//! Policy store collaborators.
//!
//! The reconciliation core never talks to the cloud API directly; it is handed
//! something implementing [`PolicyStore`]. Client caching, retries and
//! timeouts are the implementation's business.

pub mod file;
pub mod memory;

pub use file::FilePolicyStore;
pub use memory::MemoryPolicyStore;

use crate::error::Result;
use crate::waf::{ResourceId, WafPolicy};

/// Maximum number of policies to list when the caller gives no limit (not an upstream limit)
pub const MAX_POLICIES_TO_FETCH: usize = 200;

/// Whether a push should wait for the upstream operation to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushMode {
    #[default]
    Wait,
    NoWait,
}

pub trait PolicyStore {
    /// Fetch a policy, `None` when it does not exist.
    fn get_policy(&self, id: &ResourceId) -> Result<Option<WafPolicy>>;

    /// Create or replace a policy.
    fn put_policy(&self, id: &ResourceId, policy: &WafPolicy, mode: PushMode) -> Result<()>;

    /// Ids of the policies in a subscription, at most `max` of them.
    fn list_policies(&self, subscription_id: &str, max: usize) -> Result<Vec<ResourceId>>;
}

impl<S: PolicyStore + ?Sized> PolicyStore for &S {
    fn get_policy(&self, id: &ResourceId) -> Result<Option<WafPolicy>> {
        (**self).get_policy(id)
    }

    fn put_policy(&self, id: &ResourceId, policy: &WafPolicy, mode: PushMode) -> Result<()> {
        (**self).put_policy(id, policy, mode)
    }

    fn list_policies(&self, subscription_id: &str, max: usize) -> Result<Vec<ResourceId>> {
        (**self).list_policies(subscription_id, max)
    }
}
