//! Access control collaborator

use crate::games::types::Identity;
use std::collections::HashSet;

pub trait AccessControl: Send + Sync {
    /// Whether `caller` may run admin operations and settle bets
    fn is_authority(&self, caller: &Identity) -> bool;

    /// Whether `caller` may place bets
    fn may_place(&self, _caller: &Identity) -> bool {
        true
    }
}

/// Single owner with an optional placement deny-list
#[derive(Debug, Clone)]
pub struct OwnerAccess {
    owner: Identity,
    blocked: HashSet<Identity>,
}

impl OwnerAccess {
    pub fn new(owner: Identity) -> Self {
        Self { owner, blocked: HashSet::new() }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn block(&mut self, identity: Identity) {
        self.blocked.insert(identity);
    }
}

impl AccessControl for OwnerAccess {
    fn is_authority(&self, caller: &Identity) -> bool {
        *caller == self.owner
    }

    fn may_place(&self, caller: &Identity) -> bool {
        !self.blocked.contains(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_only_authority() {
        let owner = Identity::from_label("owner");
        let access = OwnerAccess::new(owner);
        assert!(access.is_authority(&owner));
        assert!(!access.is_authority(&Identity::from_label("player")));
    }

    #[test]
    fn test_blocked_identity_cannot_place() {
        let player = Identity::from_label("player");
        let mut access = OwnerAccess::new(Identity::from_label("owner"));
        assert!(access.may_place(&player));
        access.block(player);
        assert!(!access.may_place(&player));
    }
}
