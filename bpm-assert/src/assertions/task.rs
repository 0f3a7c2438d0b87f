use std::fmt;

use crate::{
    ProcessEngine, Result, Task, TaskQuery,
    assertions::failure,
    error::Error,
};

/// Assertions on a user task.
///
/// The task is looked up again on every call, so assertions see the current
/// assignee and fail once the task has been completed.
pub struct TaskAssert<'a, E: ProcessEngine> {
    engine: &'a E,
    actual: Task,
}

impl<E: ProcessEngine> fmt::Debug for TaskAssert<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAssert")
            .field("actual", &self.actual)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ProcessEngine> TaskAssert<'a, E> {
    pub(crate) fn new(engine: &'a E, actual: Task) -> Self {
        Self { engine, actual }
    }

    /// Returns the task under test, as it was when the assertion was created.
    pub fn actual(&self) -> &Task {
        &self.actual
    }

    pub async fn is_assigned_to(&self, user_id: &str) -> Result<&Self> {
        if user_id.is_empty() {
            return Err(Error::illegal_argument(
                "Expecting userId not to be null or empty.",
            ));
        }
        let current = self.current().await?;
        if current.assignee.as_deref() != Some(user_id) {
            return Err(failure(format!(
                "Expecting {} to be assigned to user '{}', but found it to be assigned to {}.",
                self.actual,
                user_id,
                describe_assignee(&current)
            )));
        }
        Ok(self)
    }

    pub async fn is_not_assigned(&self) -> Result<&Self> {
        let current = self.current().await?;
        if current.assignee.is_some() {
            return Err(failure(format!(
                "Expecting {} not to be assigned, but found it to be assigned to {}.",
                self.actual,
                describe_assignee(&current)
            )));
        }
        Ok(self)
    }

    pub async fn has_name(&self, name: &str) -> Result<&Self> {
        let current = self.current().await?;
        if current.name.as_deref() != Some(name) {
            return Err(failure(format!(
                "Expecting {} to have name '{}', but found it to be named '{}'.",
                self.actual,
                name,
                current.name.as_deref().unwrap_or("null")
            )));
        }
        Ok(self)
    }

    /// Asserts the task's activity id in the process model.
    pub async fn has_definition_key(&self, key: &str) -> Result<&Self> {
        let current = self.current().await?;
        if current.task_definition_key != key {
            return Err(failure(format!(
                "Expecting {} to have definition key '{}', but found it to have '{}'.",
                self.actual, key, current.task_definition_key
            )));
        }
        Ok(self)
    }

    async fn current(&self) -> Result<Task> {
        tracing::debug!(task = %self.actual.id, "querying current task state");
        let query = TaskQuery::new().with_task_id(&self.actual.id);
        self.engine
            .tasks(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                failure(format!(
                    "Expecting {} to be open, but it has been completed or deleted.",
                    self.actual
                ))
            })
    }
}

fn describe_assignee(task: &Task) -> String {
    match &task.assignee {
        Some(user) => format!("user '{user}'"),
        None => "no one".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(assignee: Option<&str>) -> Task {
        Task {
            id: "t-1".into(),
            process_instance_id: "pi-1".into(),
            task_definition_key: "Approve".into(),
            name: Some("Approve invoice".into()),
            assignee: assignee.map(str::to_string),
        }
    }

    #[test]
    fn describe_assignee_names_user_or_no_one() {
        assert_eq!(describe_assignee(&task(Some("kermit"))), "user 'kermit'");
        assert_eq!(describe_assignee(&task(None)), "no one");
    }
}
