//! The plan-application engine.
//!
//! [`PlanApplier`] consumes a [`Plan`] and drives the injected
//! [`AuthorizationBackend`] through all removals, then all additions, in the
//! plan's encoded order. Per-addition lifecycle:
//!
//! `Unresolved -> Resolved -> { AlreadyExists | Creating -> { Created | Exhausted } }`
//!
//! No outcome of an individual record aborts the batch; the engine is
//! best-effort across the whole plan and reports every outcome in the
//! returned [`ApplyReport`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::{AuthorizationBackend, BindingRequest};
use crate::cache::IdentityCache;
use crate::plan::{AssignmentRecord, Plan};
use crate::retry::RetryConfig;
use crate::types::{PrincipalId, RoleDefinitionId, Scope};

/// Terminal outcome of one addition record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionOutcome {
    /// The binding was already present; creation was not attempted.
    AlreadyExists,
    /// The binding was created on the given attempt (1-indexed).
    Created {
        /// Attempts consumed, including the successful one.
        attempts: u32,
    },
    /// Every attempt in the budget failed.
    Exhausted {
        /// Attempts consumed.
        attempts: u32,
    },
    /// No principal id could be resolved; creation was skipped.
    Unresolved,
}

impl AdditionOutcome {
    /// True when the addition ended in its desired state.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyExists | Self::Created { .. })
    }
}

/// Terminal outcome of one removal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The delete call succeeded.
    Removed,
    /// The delete call failed; the failure was suppressed.
    Failed {
        /// Description of the suppressed failure.
        message: String,
    },
}

/// Outcome of one addition, tied back to the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionResult {
    /// Scope of the addition.
    pub scope: Scope,
    /// Role definition of the addition.
    pub role_definition_id: RoleDefinitionId,
    /// Principal the record resolved to, when resolution succeeded.
    pub principal_id: Option<PrincipalId>,
    /// Terminal outcome.
    pub outcome: AdditionOutcome,
}

/// Outcome of one removal, tied back to the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalResult {
    /// Scope of the removal.
    pub scope: Scope,
    /// Role definition of the removal.
    pub role_definition_id: RoleDefinitionId,
    /// Terminal outcome.
    pub outcome: RemovalOutcome,
}

/// Whether a plan was applied at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// No plan was produced for this run; nothing was applied.
    Skipped,
    /// A plan was applied (possibly empty).
    Applied {
        /// Creation timestamp of the plan.
        created_on: DateTime<Utc>,
    },
}

/// Everything a run did, as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Whether a plan was applied.
    pub status: PlanStatus,
    /// Removal outcomes, in plan order.
    pub removals: Vec<RemovalResult>,
    /// Addition outcomes, in plan order.
    pub additions: Vec<AdditionResult>,
}

impl ApplyReport {
    /// Report for a run with no plan.
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            status: PlanStatus::Skipped,
            removals: Vec::new(),
            additions: Vec::new(),
        }
    }

    /// True when any addition exhausted its retry budget or could not be
    /// resolved. Removal failures are best-effort and do not degrade a run.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.additions
            .iter()
            .any(|result| !result.outcome.is_success())
    }
}

/// Applies a plan against an authorization backend.
pub struct PlanApplier<'a, B: AuthorizationBackend + ?Sized> {
    backend: &'a B,
    retry: RetryConfig,
}

impl<'a, B: AuthorizationBackend + ?Sized> PlanApplier<'a, B> {
    /// Create an applier with the default retry policy.
    #[must_use]
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            retry: RetryConfig::default(),
        }
    }

    /// Builder: override the creation retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Apply a plan: all removals, then all additions, in plan order.
    ///
    /// `None` means no plan was produced for this run; the applier performs
    /// no backend calls and reports a skip.
    pub async fn apply(&self, plan: Option<&Plan>) -> ApplyReport {
        let Some(plan) = plan else {
            info!("no role-assignment plan for this run; deployment skipped");
            return ApplyReport::skipped();
        };

        info!(
            created_on = %plan.created_on,
            additions = plan.role_assignments.added.len(),
            removals = plan.role_assignments.removed.len(),
            "applying role-assignment plan"
        );

        let removals = self.apply_removals(&plan.role_assignments.removed).await;
        let additions = self.apply_additions(&plan.role_assignments.added).await;

        ApplyReport {
            status: PlanStatus::Applied {
                created_on: plan.created_on,
            },
            removals,
            additions,
        }
    }

    async fn apply_removals(&self, removed: &[AssignmentRecord]) -> Vec<RemovalResult> {
        let mut results = Vec::with_capacity(removed.len());
        for record in removed {
            let outcome = self.remove_binding(record).await;
            results.push(RemovalResult {
                scope: record.scope.clone(),
                role_definition_id: record.role_definition_id.clone(),
                outcome,
            });
        }
        results
    }

    /// Exactly one delete attempt per record; all failures are suppressed so
    /// one bad record cannot block the rest of the removal pass.
    async fn remove_binding(&self, record: &AssignmentRecord) -> RemovalOutcome {
        let Some(principal_id) = &record.principal_id else {
            warn!(
                scope = %record.scope,
                role = %record.role_display_name,
                "removal record has no principal id; skipping"
            );
            return RemovalOutcome::Failed {
                message: "removal record has no principal id".to_string(),
            };
        };

        match self
            .backend
            .delete_binding(&record.scope, principal_id, &record.role_definition_id)
            .await
        {
            Ok(()) => {
                info!(
                    scope = %record.scope,
                    principal = %principal_id,
                    role = %record.role_display_name,
                    "removed role assignment"
                );
                RemovalOutcome::Removed
            }
            Err(err) => {
                warn!(
                    scope = %record.scope,
                    principal = %principal_id,
                    role = %record.role_display_name,
                    error = %err,
                    "failed to remove role assignment; continuing"
                );
                RemovalOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    async fn apply_additions(&self, added: &[AssignmentRecord]) -> Vec<AdditionResult> {
        let mut cache = IdentityCache::new();
        let mut results = Vec::with_capacity(added.len());
        for record in added {
            let (principal_id, outcome) = self.apply_addition(record, &mut cache).await;
            results.push(AdditionResult {
                scope: record.scope.clone(),
                role_definition_id: record.role_definition_id.clone(),
                principal_id,
                outcome,
            });
        }
        results
    }

    async fn apply_addition(
        &self,
        record: &AssignmentRecord,
        cache: &mut IdentityCache,
    ) -> (Option<PrincipalId>, AdditionOutcome) {
        let Some(principal_id) = self.resolve_principal(record, cache).await else {
            return (None, AdditionOutcome::Unresolved);
        };

        if self.binding_exists(record, &principal_id).await {
            info!(
                scope = %record.scope,
                principal = %principal_id,
                role = %record.role_display_name,
                "role assignment already exists; skipping"
            );
            return (Some(principal_id), AdditionOutcome::AlreadyExists);
        }

        let request = BindingRequest {
            principal_id: principal_id.clone(),
            object_type: record.object_type.clone(),
            scope: record.scope.clone(),
            role_definition_id: record.role_definition_id.clone(),
        };
        let outcome = self.create_with_retry(&request, record).await;
        (Some(principal_id), outcome)
    }

    /// Resolve the principal for an addition, consulting the per-run cache
    /// before issuing an external lookup.
    ///
    /// The loaded plan is never mutated; the resolved principal flows through
    /// the returned value only. A lookup that yields no identity (or errors)
    /// resolves to `None`, which the caller treats as a non-retryable skip.
    async fn resolve_principal(
        &self,
        record: &AssignmentRecord,
        cache: &mut IdentityCache,
    ) -> Option<PrincipalId> {
        if let Some(principal_id) = &record.principal_id {
            return Some(principal_id.clone());
        }

        let Some(assignment_id) = &record.assignment_id else {
            warn!(
                scope = %record.scope,
                role = %record.role_display_name,
                "addition has neither principal id nor assignment id; skipping"
            );
            return None;
        };

        if let Some(cached) = cache.get(assignment_id) {
            debug!(assignment = %assignment_id, "identity cache hit");
            return cached
                .as_ref()
                .map(|identity| identity.principal_id.clone());
        }

        match self.backend.lookup_assignment_identity(assignment_id).await {
            Ok(Some(identity)) => {
                let principal_id = identity.principal_id.clone();
                cache.insert(assignment_id.clone(), Some(identity));
                Some(principal_id)
            }
            Ok(None) => {
                warn!(
                    assignment = %assignment_id,
                    scope = %record.scope,
                    "policy assignment has no managed identity; skipping addition"
                );
                cache.insert(assignment_id.clone(), None);
                None
            }
            Err(err) => {
                warn!(
                    assignment = %assignment_id,
                    scope = %record.scope,
                    error = %err,
                    "identity lookup failed; skipping addition"
                );
                None
            }
        }
    }

    /// Membership test for an addition. A failed query is suppressed and
    /// treated as "does not exist"; the creation retry loop absorbs the
    /// consequences if the binding was actually there.
    async fn binding_exists(&self, record: &AssignmentRecord, principal_id: &PrincipalId) -> bool {
        match self
            .backend
            .binding_exists(&record.scope, principal_id, &record.role_definition_id)
            .await
        {
            Ok(exists) => exists,
            Err(err) => {
                warn!(
                    scope = %record.scope,
                    principal = %principal_id,
                    error = %err,
                    "existence query failed; assuming binding does not exist"
                );
                false
            }
        }
    }

    /// Bounded fixed-interval creation loop.
    ///
    /// A `Ok(None)` result and a backend error are the same failed attempt;
    /// no classification exists. Exhaustion is a typed, non-fatal outcome.
    async fn create_with_retry(
        &self,
        request: &BindingRequest,
        record: &AssignmentRecord,
    ) -> AdditionOutcome {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let Some(delay) = self.retry.delay_before(attempt) else {
                let attempts = attempt - 1;
                warn!(
                    scope = %record.scope,
                    principal = %request.principal_id,
                    role = %record.role_display_name,
                    attempts,
                    "creation failed after all attempts; continuing with next record"
                );
                return AdditionOutcome::Exhausted { attempts };
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.backend.create_binding(request).await {
                Ok(Some(created)) => {
                    info!(
                        scope = %record.scope,
                        principal = %request.principal_id,
                        role = %record.role_display_name,
                        binding = %created.id,
                        attempt,
                        "created role assignment"
                    );
                    return AdditionOutcome::Created { attempts: attempt };
                }
                Ok(None) => {
                    warn!(
                        scope = %record.scope,
                        principal = %request.principal_id,
                        attempt,
                        "create call returned no result; will retry"
                    );
                }
                Err(err) => {
                    warn!(
                        scope = %record.scope,
                        principal = %request.principal_id,
                        attempt,
                        error = %err,
                        "create call failed; will retry"
                    );
                }
            }
        }
    }
}
