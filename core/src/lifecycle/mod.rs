//! Request lifecycle state machine.
//!
//! Decides whether an actor may move a request to a target status, derives the
//! column values to write, and emits the ledger adjustment the transition implies.
//!
//! # Flow
//!
//! ```text
//! SubmitStatusChange(role, id, target, patch)
//!     ↓
//! target ∈ role.allowed_targets()?  ── no ──→ InvalidTransition
//!     ↓
//! request snapshot present?         ── no ──→ NotFound
//!     ↓
//! WriteRequest { status, patch, sentinel on 6/8, updated_at = now }
//!     ↓
//! target == 6 → Ledger(Decrement)   target == 8 → Ledger(Increment)
//! ```
//!
//! The transition table is role-gated target membership only: the previous
//! status is not consulted.

pub mod actions;
pub mod authorization;
pub mod environment;
pub mod reducer;

pub use actions::{LifecycleAction, RequestInput, RequestPatch};
pub use authorization::AllowedStatuses;
pub use environment::LifecycleEnvironment;
pub use reducer::{LifecycleReducer, LifecycleState};
