//! Permission system for platform roles
//!
//! Each role maps to one fixed [`Permissions`] record. Callers gate actions
//! by looking the record up, never by branching on the role directly.

use crate::error::{Error, Result};
use crate::models::Role;

/// Actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateRecipes,
    AssumeProductions,
    Invest,
    ManageUsers,
    Vote,
    ModerateVotes,
    ManageProductions,
}

impl Capability {
    pub fn describe(&self) -> &'static str {
        match self {
            Capability::CreateRecipes => "create recipes",
            Capability::AssumeProductions => "assume productions",
            Capability::Invest => "invest",
            Capability::ManageUsers => "manage users",
            Capability::Vote => "vote",
            Capability::ModerateVotes => "moderate votes",
            Capability::ManageProductions => "manage productions",
        }
    }
}

/// What a role is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub can_create_recipes: bool,
    pub can_assume_productions: bool,
    pub can_invest: bool,
    pub can_manage_users: bool,
    pub can_vote: bool,
    pub can_moderate_votes: bool,
    pub can_manage_productions: bool,
}

const ADMIN: Permissions = Permissions {
    can_create_recipes: true,
    can_assume_productions: true,
    can_invest: true,
    can_manage_users: true,
    can_vote: true,
    can_moderate_votes: true,
    can_manage_productions: true,
};

const BREWER: Permissions = Permissions {
    can_create_recipes: true,
    can_assume_productions: true,
    can_invest: false,
    can_manage_users: false,
    can_vote: true,
    can_moderate_votes: false,
    can_manage_productions: true,
};

const INVESTOR: Permissions = Permissions {
    can_create_recipes: false,
    can_assume_productions: false,
    can_invest: true,
    can_manage_users: false,
    can_vote: true,
    can_moderate_votes: false,
    can_manage_productions: false,
};

impl Permissions {
    /// Look up the permission record for a role
    pub const fn for_role(role: Role) -> Permissions {
        match role {
            Role::Admin => ADMIN,
            Role::Brewer => BREWER,
            Role::Investor => INVESTOR,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::CreateRecipes => self.can_create_recipes,
            Capability::AssumeProductions => self.can_assume_productions,
            Capability::Invest => self.can_invest,
            Capability::ManageUsers => self.can_manage_users,
            Capability::Vote => self.can_vote,
            Capability::ModerateVotes => self.can_moderate_votes,
            Capability::ManageProductions => self.can_manage_productions,
        }
    }
}

/// Check if a role may perform an action
pub fn can_perform(role: Role, capability: Capability) -> bool {
    Permissions::for_role(role).allows(capability)
}

/// Fail with `PermissionDenied` unless the role may perform the action
pub fn require(role: Role, capability: Capability) -> Result<()> {
    if can_perform(role, capability) {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "{} cannot {}",
            role.display_name(),
            capability.describe()
        )))
    }
}

/// Role gate: is the role one of the allowed roles
pub fn has_role(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_permissions() {
        for cap in [
            Capability::CreateRecipes,
            Capability::AssumeProductions,
            Capability::Invest,
            Capability::ManageUsers,
            Capability::Vote,
            Capability::ModerateVotes,
            Capability::ManageProductions,
        ] {
            assert!(can_perform(Role::Admin, cap), "admin should {}", cap.describe());
        }
    }

    #[test]
    fn test_brewer_permissions() {
        assert!(can_perform(Role::Brewer, Capability::CreateRecipes));
        assert!(can_perform(Role::Brewer, Capability::AssumeProductions));
        assert!(can_perform(Role::Brewer, Capability::ManageProductions));
        assert!(can_perform(Role::Brewer, Capability::Vote));
        assert!(!can_perform(Role::Brewer, Capability::Invest));
        assert!(!can_perform(Role::Brewer, Capability::ManageUsers));
        assert!(!can_perform(Role::Brewer, Capability::ModerateVotes));
    }

    #[test]
    fn test_investor_permissions() {
        assert!(can_perform(Role::Investor, Capability::Invest));
        assert!(can_perform(Role::Investor, Capability::Vote));
        assert!(!can_perform(Role::Investor, Capability::CreateRecipes));
        assert!(!can_perform(Role::Investor, Capability::ManageProductions));
    }

    #[test]
    fn test_require_denies() {
        let err = require(Role::Investor, Capability::ManageUsers).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(require(Role::Admin, Capability::ManageUsers).is_ok());
    }

    #[test]
    fn test_role_gate() {
        assert!(has_role(Role::Brewer, &[Role::Admin, Role::Brewer]));
        assert!(!has_role(Role::Investor, &[Role::Admin]));
    }
}
