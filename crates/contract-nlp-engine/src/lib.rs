//! Session-keyed contract-creation workflow and the [`NlpService`] façade.

pub mod error;
pub mod service;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod workflow;

pub use error::EngineError;
pub use service::{NlpService, Turn};
pub use session::{Session, SessionStatus};
pub use store::SessionStore;
pub use sweeper::spawn_sweeper;
pub use workflow::{ContractWorkflow, WorkflowResult, merged_query};
