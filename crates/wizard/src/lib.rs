//! Promo wizard backend: draft sessions, the incentive step controller,
//! the reward API client, and the REST surface the dashboards call.
//!
//! Drafts live behind the `DraftStorage` port: in-memory (DashMap) for
//! development and tests, one JSON file per draft otherwise.

pub mod backend;
pub mod handlers;
pub mod router;
pub mod session;
pub mod step;
pub mod storage;

pub use backend::{HttpRewardsBackend, MemoryRewardsBackend, RewardsBackend};
pub use handlers::WizardState;
pub use router::wizard_router;
pub use session::{SessionStore, WizardSession};
pub use step::IncentiveStep;
pub use storage::{DraftStorage, FileDraftStorage, MemoryDraftStorage};
