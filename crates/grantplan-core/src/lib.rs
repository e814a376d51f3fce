//! Core plan-application engine for role-assignment bindings.
//!
//! Given a precomputed [`Plan`] of additions and removals, [`PlanApplier`]
//! reconciles the desired bindings against a live authorization service
//! reached through the injected [`AuthorizationBackend`] trait:
//!
//! - removals first, one best-effort delete each;
//! - then additions: resolve a missing principal from the owning policy
//!   assignment's managed identity (cached per run), skip bindings that
//!   already exist, create the rest with a bounded fixed-interval retry
//!   loop.
//!
//! The engine performs no I/O of its own and never lets one bad record halt
//! the remainder of the plan.

pub mod apply;
pub mod backend;
pub mod cache;
pub mod plan;
pub mod retry;
pub mod types;

pub use apply::{
    AdditionOutcome, AdditionResult, ApplyReport, PlanApplier, PlanStatus, RemovalOutcome,
    RemovalResult,
};
pub use backend::{
    AuthorizationBackend, BackendError, BackendResult, BindingRequest, CreatedBinding,
};
pub use cache::IdentityCache;
pub use plan::{AssignmentRecord, Plan, PlanError, RoleAssignmentDelta};
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, RetryConfig};
pub use types::{
    ManagedIdentity, PolicyAssignmentId, PrincipalId, PrincipalKind, RoleDefinitionId, Scope,
};
