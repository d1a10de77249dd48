//! Role resolution for a caller against a scope.

use crate::db::Store;
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Global,
    Jam(&'a str),
}

/// What a caller may do. Ordered so that a higher role includes the lower
/// ones: `Admin > Manager > Owner > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    None,
    Owner,
    Manager,
    Admin,
}

impl Role {
    /// Admin, or manager of the jam in scope.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        self >= Self::Manager
    }

    /// Owner of the resource, or anything above.
    #[must_use]
    pub fn can_act_as_owner(self) -> bool {
        self >= Self::Owner
    }
}

/// Role from already-known facts. Banned users get nothing.
#[must_use]
pub fn classify(user: &User, is_manager: bool, resource_owner: Option<&str>) -> Role {
    if user.banned {
        Role::None
    } else if user.admin {
        Role::Admin
    } else if is_manager {
        Role::Manager
    } else if resource_owner.is_some_and(|owner| user.is_named(owner)) {
        Role::Owner
    } else {
        Role::None
    }
}

#[derive(Clone)]
pub struct Authorizer {
    store: Store,
}

impl Authorizer {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Resolves the caller's role. Anonymous callers resolve to [`Role::None`].
    pub async fn resolve(
        &self,
        user: Option<&User>,
        scope: Scope<'_>,
        resource_owner: Option<&str>,
    ) -> anyhow::Result<Role> {
        let Some(user) = user else {
            return Ok(Role::None);
        };

        if user.banned || user.admin {
            return Ok(classify(user, false, resource_owner));
        }

        let is_manager = match scope {
            Scope::Global => false,
            Scope::Jam(slug) => self.store.is_manager(slug, &user.name).await?,
        };

        Ok(classify(user, is_manager, resource_owner))
    }
}
