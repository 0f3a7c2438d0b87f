//! Fluent assertions over engine entities.
//!
//! Start from [`ProcessEngineAssertions`], which binds an engine and hands out
//! one assertion object per entity type:
//!
//! ```ignore
//! let assertions = ProcessEngineAssertions::new(&engine);
//!
//! assertions
//!     .process_instance(&instance)
//!     .is_not_waiting_for("myMessage")
//!     .await?
//!     .is_waiting_for("yourMessage")
//!     .await?;
//!
//! assertions.task(&task).is_assigned_to("kermit").await?;
//! ```
//!
//! Every assertion queries the engine when it runs and holds no snapshot of
//! engine state. Misuse (e.g. an empty name list) yields
//! [`Error::IllegalArgument`](crate::Error::IllegalArgument) before any query;
//! an unmet expectation yields
//! [`Error::AssertionFailed`](crate::Error::AssertionFailed) with a message
//! naming the entity and the condition.

mod job;
mod process_definition;
mod process_instance;
mod task;

pub use job::JobAssert;
pub use process_definition::ProcessDefinitionAssert;
pub use process_instance::ProcessInstanceAssert;
pub use task::TaskAssert;

use std::fmt;

use crate::{Error, Job, ProcessDefinition, ProcessEngine, ProcessInstance, Task};

/// Entry point handing out assertion objects bound to one engine.
pub struct ProcessEngineAssertions<'a, E: ProcessEngine> {
    engine: &'a E,
}

impl<E: ProcessEngine> fmt::Debug for ProcessEngineAssertions<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessEngineAssertions")
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl<E: ProcessEngine> Clone for ProcessEngineAssertions<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ProcessEngine> Copy for ProcessEngineAssertions<'_, E> {}

impl<'a, E: ProcessEngine> ProcessEngineAssertions<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Returns the engine assertions are evaluated against.
    pub fn engine(&self) -> &'a E {
        self.engine
    }

    /// Assertions on a process definition.
    pub fn process_definition(&self, actual: &ProcessDefinition) -> ProcessDefinitionAssert<'a, E> {
        ProcessDefinitionAssert::new(self.engine, actual.clone())
    }

    /// Assertions on a process instance.
    pub fn process_instance(&self, actual: &ProcessInstance) -> ProcessInstanceAssert<'a, E> {
        ProcessInstanceAssert::new(self.engine, actual.clone())
    }

    /// Assertions on a user task.
    pub fn task(&self, actual: &Task) -> TaskAssert<'a, E> {
        TaskAssert::new(self.engine, actual.clone())
    }

    /// Assertions on a job.
    pub fn job(&self, actual: &Job) -> JobAssert<'a, E> {
        JobAssert::new(self.engine, actual.clone())
    }
}

/// Builds an assertion failure and logs it.
pub(crate) fn failure(message: String) -> Error {
    tracing::warn!(%message, "assertion failed");
    Error::failed(message)
}

/// Formats names as `[a, b]` for failure messages.
pub(crate) fn list<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_formats_names() {
        assert_eq!(list::<&str>(&[]), "[]");
        assert_eq!(list(&["a", "b"]), "[a, b]");
        assert_eq!(list(&["only".to_string()]), "[only]");
    }

    #[test]
    fn failure_is_assertion_error() {
        let err = failure("Expecting something".into());
        assert_eq!(err, Error::AssertionFailed("Expecting something".into()));
    }
}
