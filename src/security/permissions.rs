//! Role based permissions

use std::collections::BTreeSet;

use crate::core::{Error, Result};
use crate::types::Role;

/// Individual capability checked by handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// View and change one's own subscription
    ManageOwnSubscription,
    /// See drafts and archived content
    ViewUnpublished,
    /// Create and update content
    WriteContent,
    /// Use the AI writer
    GenerateContent,
    /// Soft-delete content
    ArchiveContent,
    /// Approve testimonials
    ModerateTestimonials,
    /// List users and change roles
    ManageUsers,
    /// Read the audit trail
    ViewAudit,
    /// Read and resolve security events
    ManageSecurity,
    /// Reset subscription usage counters
    ResetUsage,
    /// Administrative access (all permissions)
    Admin,
}

/// Set of permissions granted to a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Nothing granted
    pub fn new() -> Self {
        Self {
            permissions: BTreeSet::new(),
        }
    }

    /// What an anonymous visitor holds: nothing beyond the public routes
    pub fn anonymous() -> Self {
        Self::new()
    }

    /// Permissions implied by a role
    pub fn for_role(role: Role) -> Self {
        let mut set = Self::anonymous();
        set.grant(Permission::ManageOwnSubscription);

        if role >= Role::Editor {
            set.grant(Permission::ViewUnpublished);
            set.grant(Permission::WriteContent);
            set.grant(Permission::GenerateContent);
        }
        if role == Role::Admin {
            set.grant(Permission::Admin);
        }
        set
    }

    /// Add a permission
    pub fn grant(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Remove a permission
    pub fn revoke(&mut self, permission: Permission) {
        self.permissions.remove(&permission);
    }

    /// Check if a specific permission is granted
    pub fn has_permission(&self, permission: Permission) -> bool {
        // Admin permission grants all others
        self.permissions.contains(&Permission::Admin) || self.permissions.contains(&permission)
    }

    /// `Forbidden` unless `permission` is granted
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(Error::forbidden(format!("missing permission {:?}", permission)))
        }
    }

    /// Check if the caller has admin access
    pub fn is_admin(&self) -> bool {
        self.has_permission(Permission::Admin)
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}
