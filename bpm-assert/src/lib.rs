#![cfg_attr(docsrs, feature(doc_cfg))]
//! # bpm-assert
//!
//! Fluent assertions for the runtime state of process engine instances.
//!
//! Write process tests that read like the model: which messages an instance
//! is waiting for, where it is waiting, which activities it has passed and
//! whether it has ended. Assertions query the engine on every call through the
//! [`ProcessEngine`] trait, so they always reflect current engine state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "memory-engine")]
//! use bpm_assert::{
//!     ProcessEngineAssertions, Result,
//!     memory::{InMemoryEngine, ProcessModel, WaitState},
//! };
//!
//! # #[cfg(feature = "memory-engine")]
//! #[tokio::main]
//! async fn main() -> Result {
//!     let engine = InMemoryEngine::default();
//!     engine
//!         .deploy(ProcessModel::new("invoice").then(WaitState::message("WaitForPayment", "paid")))
//!         .await?;
//!
//!     let instance = engine.start_process_instance_by_key("invoice").await?;
//!     let assertions = ProcessEngineAssertions::new(&engine);
//!
//!     assertions
//!         .process_instance(&instance)
//!         .is_waiting_for("paid")
//!         .await?;
//!
//!     engine.correlate_message("paid").await?;
//!
//!     assertions
//!         .process_instance(&instance)
//!         .is_not_waiting_for("paid")
//!         .await?
//!         .is_ended()
//!         .await?;
//!     Ok(())
//! }
//! # #[cfg(not(feature = "memory-engine"))]
//! # fn main() {}
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProcessEngine`] | Read-only query API the assertions run against |
//! | [`ProcessEngineAssertions`] | Hands out assertion objects bound to one engine |
//! | [`ProcessInstanceAssert`] | Waiting, ended, suspension, history and variable checks |
//! | [`TaskAssert`] / [`JobAssert`] | Checks on open user tasks and pending jobs |
//! | [`EngineBinding`] | Resolves the engine to use from an [`EngineRegistry`] |
//! | [`IntoNames`] | Argument type for message, activity and variable names |
//!
//! ## Errors
//!
//! Assertions return [`Result`]. An unmet expectation is
//! [`Error::AssertionFailed`]; invalid arguments are rejected with
//! [`Error::IllegalArgument`] before the engine is queried.
//!
//! ## Features
//!
//! - **`memory-engine`** (default) - [`memory::InMemoryEngine`] for driving assertions in tests
//! - **`serde`** - Serialize/Deserialize for entities, ids and [`EngineConfig`]
//!
//! ## Examples
//!
//! - `message_correlation.rs` - Correlating messages and asserting on waiting instances

mod args;
pub mod assertions;
mod binding;
mod config;
mod engine;
mod entity;
mod error;
mod id;
mod query;

#[cfg(feature = "memory-engine")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory-engine")))]
pub mod memory;

pub use args::{IntoNames, NameItem};
pub use assertions::{
    JobAssert, ProcessDefinitionAssert, ProcessEngineAssertions, ProcessInstanceAssert, TaskAssert,
};
pub use binding::{EngineBinding, EngineRegistry};
pub use config::EngineConfig;
pub use engine::ProcessEngine;
pub use entity::{EventSubscription, EventType, Job, ProcessDefinition, ProcessInstance, Task};
pub use error::Error;
pub use id::{JobId, ProcessDefinitionId, ProcessInstanceId, SubscriptionId, TaskId};
pub use query::{EventSubscriptionQuery, JobQuery, ProcessInstanceQuery, TaskQuery};

/// Convenience alias for `Result<T, bpm_assert::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
