//! Per-user entitlement record.
//!
//! # Access policy
//!
//! Only the `individual` plan is scoped. For it, a ledger with no grants at
//! all fails open (new users are not blocked). Once any grant exists, the
//! ledger is authoritative: only targets with a usable grant are open.

use serde::{Deserialize, Serialize};

use super::{AccessGrant, GrantStatus};
use crate::domain::foundation::{Timestamp, UserId, ValidationError};
use crate::domain::plan::PlanTierId;

/// Grants of one kind (concursos or packages) plus the derived active list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLedger {
    /// Every grant ever issued, newest last.
    pub grants: Vec<AccessGrant>,
    /// Names with a currently active grant.
    pub active: Vec<String>,
}

impl AccessLedger {
    /// Flips stale grants to `expired` and drops them from the active list.
    ///
    /// Returns true if anything changed.
    pub fn compact(&mut self, now: &Timestamp) -> bool {
        let mut changed = false;
        for grant in self.grants.iter_mut().filter(|g| g.is_stale_at(now)) {
            if grant.mark(GrantStatus::Expired).is_ok() {
                self.active.retain(|name| name != &grant.name);
                changed = true;
            }
        }
        changed
    }

    /// Fail-open decision for scoped plans.
    pub fn allows(&self, name: &str, now: &Timestamp) -> bool {
        if self.grants.is_empty() {
            return true;
        }
        let name = name.trim();
        self.grants
            .iter()
            .any(|g| g.name == name && g.is_usable_at(now))
    }

    /// Issues a grant, superseding any active one for the same name.
    pub fn grant(
        &mut self,
        name: &str,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<(), ValidationError> {
        let grant = AccessGrant::new(name, now, expires_at)?;
        for old in self
            .grants
            .iter_mut()
            .filter(|g| g.name == grant.name && g.status == GrantStatus::Active)
        {
            old.mark(GrantStatus::Revoked)?;
        }
        if !self.active.contains(&grant.name) {
            self.active.push(grant.name.clone());
        }
        self.grants.push(grant);
        Ok(())
    }

    /// Revokes the active grant for `name`. Returns false if none exists.
    pub fn revoke(&mut self, name: &str) -> bool {
        let name = name.trim();
        let Some(grant) = self
            .grants
            .iter_mut()
            .find(|g| g.name == name && g.status == GrantStatus::Active)
        else {
            return false;
        };
        if grant.mark(GrantStatus::Revoked).is_err() {
            return false;
        }
        self.active.retain(|n| n != name);
        true
    }

    /// Number of active grants.
    pub fn active_count(&self) -> u32 {
        self.active.len() as u32
    }

    /// Revokes the oldest active grants until `keep` fits within `limit`.
    ///
    /// Returns the revoked names. Nothing changes when `keep` is already
    /// active.
    pub fn make_room(&mut self, keep: &str, limit: u32) -> Vec<String> {
        let keep = keep.trim();
        if self.active.iter().any(|n| n == keep) {
            return Vec::new();
        }
        let mut revoked = Vec::new();
        while self.active_count() >= limit.max(1) {
            let oldest = self.active[0].clone();
            if !self.revoke(&oldest) {
                // Listed without an active grant: drop the stale entry.
                self.active.retain(|n| n != &oldest);
            }
            revoked.push(oldest);
        }
        revoked
    }

    /// Returns the most recent grant for `name`, if any.
    pub fn latest(&self, name: &str) -> Option<&AccessGrant> {
        let name = name.trim();
        self.grants.iter().rev().find(|g| g.name == name)
    }
}

/// Resolved permissions of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntitlement {
    pub user_id: UserId,
    pub plan: PlanTierId,
    pub concursos: AccessLedger,
    pub packages: AccessLedger,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserEntitlement {
    /// Creates the lazily-initialised record for a user.
    pub fn new(user_id: UserId, plan: PlanTierId) -> Self {
        let now = Timestamp::now();
        Self {
            user_id,
            plan,
            concursos: AccessLedger::default(),
            packages: AccessLedger::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Lazy expiry over both ledgers. Returns true if the record changed.
    pub fn compact_expired(&mut self, now: &Timestamp) -> bool {
        let concursos = self.concursos.compact(now);
        let packages = self.packages.compact(now);
        if concursos || packages {
            self.updated_at = *now;
        }
        concursos || packages
    }

    /// Plan-level access to a concurso, ignoring admin overrides.
    pub fn allows_concurso(&self, concurso: &str, now: &Timestamp) -> bool {
        match self.plan {
            PlanTierId::Individual => self.concursos.allows(concurso, now),
            PlanTierId::Trial | PlanTierId::Free | PlanTierId::Plus => true,
        }
    }

    /// Plan-level access to a package, ignoring admin overrides.
    pub fn allows_package(&self, package: &str, now: &Timestamp) -> bool {
        match self.plan {
            PlanTierId::Individual => self.packages.allows(package, now),
            PlanTierId::Trial | PlanTierId::Free | PlanTierId::Plus => true,
        }
    }

    pub fn active_concursos(&self) -> &[String] {
        &self.concursos.active
    }

    pub fn assigned_packages(&self) -> &[String] {
        &self.packages.active
    }

    /// Changes the plan, returning the previous one.
    pub fn change_plan(&mut self, plan: PlanTierId) -> PlanTierId {
        let previous = self.plan;
        self.plan = plan;
        self.updated_at = Timestamp::now();
        previous
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
