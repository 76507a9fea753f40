//! Entitlement resolution and admin grant management.
//!
//! Access checks never fail: an unreadable record resolves as a brand-new
//! user on the free plan. Every check also compacts expired grants and
//! persists the record, but only when compaction changed something.
//!
//! Every write holds the user's entitlement lock from read to save.

use std::collections::HashSet;
use std::sync::Arc;

use super::TypedStore;
use crate::domain::entitlement::UserEntitlement;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::plan::{PlanCatalog, PlanTierId};
use crate::ports::StoreKey;

/// Which ledger an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Concurso,
    Package,
}

pub struct EntitlementResolver {
    store: TypedStore,
    catalog: Arc<PlanCatalog>,
    admins: HashSet<UserId>,
}

impl EntitlementResolver {
    pub fn new(store: TypedStore, catalog: Arc<PlanCatalog>, admins: Vec<UserId>) -> Self {
        Self {
            store,
            catalog,
            admins: admins.into_iter().collect(),
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admins.contains(user)
    }

    /// Current plan; `free` when no record exists.
    pub async fn resolve_plan(&self, user: &UserId) -> PlanTierId {
        self.store
            .load::<UserEntitlement>(&StoreKey::entitlement(user))
            .await
            .map(|e| e.plan)
            .unwrap_or(PlanTierId::Free)
    }

    /// Compacted snapshot of the user's entitlement.
    pub async fn entitlement(&self, user: &UserId) -> UserEntitlement {
        self.load_compacted(user).await
    }

    pub async fn can_access_concurso(&self, user: &UserId, concurso: &str) -> bool {
        self.can_access(user, concurso, Target::Concurso).await
    }

    pub async fn can_access_package(&self, user: &UserId, package: &str) -> bool {
        self.can_access(user, package, Target::Package).await
    }

    async fn can_access(&self, user: &UserId, name: &str, target: Target) -> bool {
        let entitlement = self.load_compacted(user).await;
        if self.is_admin(user) {
            return true;
        }
        let now = Timestamp::now();
        let allowed = match target {
            Target::Concurso => entitlement.allows_concurso(name, &now),
            Target::Package => entitlement.allows_package(name, &now),
        };
        tracing::debug!(
            user = %user,
            plan = %entitlement.plan,
            target = ?target,
            name,
            allowed,
            "access check"
        );
        allowed
    }

    /// Reads the record and applies lazy expiry, persisting flips.
    async fn load_compacted(&self, user: &UserId) -> UserEntitlement {
        let key = StoreKey::entitlement(user);
        let Some(mut snapshot) = self.store.load::<UserEntitlement>(&key).await else {
            return UserEntitlement::new(user.clone(), PlanTierId::Free);
        };
        if !snapshot.compact_expired(&Timestamp::now()) {
            return snapshot;
        }

        // Re-read under the lock so a concurrent grant is not overwritten.
        let _guard = self.store.lock(&key).await;
        let Some(mut entitlement) = self.store.load::<UserEntitlement>(&key).await else {
            return snapshot;
        };
        if entitlement.compact_expired(&Timestamp::now()) {
            tracing::info!(user = %user, "expired grants compacted");
            if let Err(e) = self.store.save(&key, &entitlement).await {
                tracing::warn!(user = %user, error = %e, "could not persist compaction");
            }
        }
        entitlement
    }

    /// Strict read ahead of an admin mutation. Creates the record lazily.
    async fn load_for_update(&self, user: &UserId) -> Result<UserEntitlement, DomainError> {
        let mut entitlement = self
            .store
            .load_for_update::<UserEntitlement>(&StoreKey::entitlement(user))
            .await?
            .unwrap_or_else(|| UserEntitlement::new(user.clone(), PlanTierId::Free));
        entitlement.compact_expired(&Timestamp::now());
        Ok(entitlement)
    }

    async fn persist(&self, entitlement: &UserEntitlement) -> Result<(), DomainError> {
        self.store
            .save(&StoreKey::entitlement(&entitlement.user_id), entitlement)
            .await
    }

    /// Sets the plan and returns the previous one.
    ///
    /// Quota is not touched here; see `QuestionQuota::change_plan`.
    pub async fn set_plan(
        &self,
        user: &UserId,
        plan: PlanTierId,
    ) -> Result<PlanTierId, DomainError> {
        let _guard = self.store.lock(&StoreKey::entitlement(user)).await;
        let mut entitlement = self.load_for_update(user).await?;
        let previous = entitlement.change_plan(plan);
        self.persist(&entitlement).await?;
        tracing::info!(user = %user, from = %previous, to = %plan, "plan changed");
        Ok(previous)
    }

    /// Grants a concurso, superseding any active grant for it.
    ///
    /// # Errors
    ///
    /// - `ConcursoLimitReached` when the plan's concurso slots are full
    pub async fn grant_concurso(
        &self,
        user: &UserId,
        concurso: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<UserEntitlement, DomainError> {
        let _guard = self.store.lock(&StoreKey::entitlement(user)).await;
        let mut entitlement = self.load_for_update(user).await?;
        let tier = self.catalog.tier(entitlement.plan);
        let already_active = entitlement
            .active_concursos()
            .iter()
            .any(|c| c == concurso.trim());
        if !already_active && tier.concurso_limit_reached(entitlement.concursos.active_count()) {
            return Err(DomainError::new(
                ErrorCode::ConcursoLimitReached,
                format!(
                    "Plan {} allows at most {} active concurso(s)",
                    tier.id.display_name(),
                    tier.max_concursos.unwrap_or(0)
                ),
            )
            .with_detail("concurso", concurso));
        }

        entitlement
            .concursos
            .grant(concurso, Timestamp::now(), expires_at)?;
        entitlement.touch();
        self.persist(&entitlement).await?;
        tracing::info!(user = %user, concurso, "concurso granted");
        Ok(entitlement)
    }

    /// Opens a bought concurso, revoking the oldest others if the plan's
    /// slots are full. Re-granting an active concurso is a no-op.
    pub async fn grant_purchased_concurso(
        &self,
        user: &UserId,
        concurso: &str,
    ) -> Result<UserEntitlement, DomainError> {
        let _guard = self.store.lock(&StoreKey::entitlement(user)).await;
        let mut entitlement = self.load_for_update(user).await?;
        let concurso = concurso.trim();
        if entitlement.active_concursos().iter().any(|c| c == concurso) {
            return Ok(entitlement);
        }

        if let Some(limit) = self.catalog.tier(entitlement.plan).max_concursos {
            let replaced = entitlement.concursos.make_room(concurso, limit);
            if !replaced.is_empty() {
                tracing::info!(user = %user, concurso, replaced = ?replaced, "concurso replaced");
            }
        }
        entitlement
            .concursos
            .grant(concurso, Timestamp::now(), None)?;
        entitlement.touch();
        self.persist(&entitlement).await?;
        tracing::info!(user = %user, concurso, "purchased concurso granted");
        Ok(entitlement)
    }

    pub async fn revoke_concurso(
        &self,
        user: &UserId,
        concurso: &str,
    ) -> Result<UserEntitlement, DomainError> {
        self.revoke(user, concurso, Target::Concurso).await
    }

    /// Grants a package. `None` expiry makes it a permanent assignment.
    pub async fn grant_package(
        &self,
        user: &UserId,
        package: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<UserEntitlement, DomainError> {
        let _guard = self.store.lock(&StoreKey::entitlement(user)).await;
        let mut entitlement = self.load_for_update(user).await?;
        entitlement
            .packages
            .grant(package, Timestamp::now(), expires_at)?;
        entitlement.touch();
        self.persist(&entitlement).await?;
        tracing::info!(user = %user, package, "package granted");
        Ok(entitlement)
    }

    pub async fn assign_package(
        &self,
        user: &UserId,
        package: &str,
    ) -> Result<UserEntitlement, DomainError> {
        self.grant_package(user, package, None).await
    }

    pub async fn revoke_package(
        &self,
        user: &UserId,
        package: &str,
    ) -> Result<UserEntitlement, DomainError> {
        self.revoke(user, package, Target::Package).await
    }

    async fn revoke(
        &self,
        user: &UserId,
        name: &str,
        target: Target,
    ) -> Result<UserEntitlement, DomainError> {
        let _guard = self.store.lock(&StoreKey::entitlement(user)).await;
        let mut entitlement = self.load_for_update(user).await?;
        let ledger = match target {
            Target::Concurso => &mut entitlement.concursos,
            Target::Package => &mut entitlement.packages,
        };
        if !ledger.revoke(name) {
            return Err(DomainError::new(
                ErrorCode::GrantNotFound,
                format!("No active grant for '{}'", name),
            ));
        }
        entitlement.touch();
        self.persist(&entitlement).await?;
        tracing::info!(user = %user, target = ?target, name, "grant revoked");
        Ok(entitlement)
    }
}
