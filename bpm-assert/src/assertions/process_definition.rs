use std::fmt;

use crate::{ProcessDefinition, ProcessEngine, ProcessInstanceQuery, Result, assertions::failure};

/// Assertions on a deployed process definition.
pub struct ProcessDefinitionAssert<'a, E: ProcessEngine> {
    engine: &'a E,
    actual: ProcessDefinition,
}

impl<E: ProcessEngine> fmt::Debug for ProcessDefinitionAssert<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDefinitionAssert")
            .field("actual", &self.actual)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ProcessEngine> ProcessDefinitionAssert<'a, E> {
    pub(crate) fn new(engine: &'a E, actual: ProcessDefinition) -> Self {
        Self { engine, actual }
    }

    pub fn actual(&self) -> &ProcessDefinition {
        &self.actual
    }

    /// Asserts the number of running, non-suspended instances of this definition.
    pub async fn has_active_instances(&self, expected: usize) -> Result<&Self> {
        tracing::debug!(process_definition = %self.actual.id, expected, "has_active_instances");
        let query = ProcessInstanceQuery::new()
            .with_process_definition_id(&self.actual.id)
            .with_active_only();
        let actual = self.engine.process_instances(&query).await?.len();
        if actual != expected {
            return Err(failure(format!(
                "Expecting {} to have {} active instances, but found {}.",
                self.actual, expected, actual
            )));
        }
        Ok(self)
    }
}
