//! Identity provider - the external source of truth for holders
//!
//! The core only needs existence, not profiles; a real deployment would put
//! the user store behind the same trait.

use crate::domain::types::HolderId;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

pub trait IdentityProvider: Send + Sync {
    fn resolve_holder(&self, holder_id: HolderId) -> bool;
}

/// In-memory holder registry
pub struct InMemoryIdentityProvider {
    holders: RwLock<FxHashSet<HolderId>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self { holders: RwLock::new(FxHashSet::default()) }
    }

    pub fn register(&self) -> HolderId {
        let id = HolderId::new();
        self.holders.write().insert(id);
        id
    }

    pub fn holder_count(&self) -> usize {
        self.holders.read().len()
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn resolve_holder(&self, holder_id: HolderId) -> bool {
        self.holders.read().contains(&holder_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let identity = InMemoryIdentityProvider::new();
        let id = identity.register();

        assert!(identity.resolve_holder(id));
        assert!(!identity.resolve_holder(HolderId::new()));
        assert_eq!(identity.holder_count(), 1);
    }
}
