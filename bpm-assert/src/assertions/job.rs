use std::fmt;

use crate::{Job, JobQuery, ProcessEngine, Result, assertions::failure};

/// Assertions on a job.
pub struct JobAssert<'a, E: ProcessEngine> {
    engine: &'a E,
    actual: Job,
}

impl<E: ProcessEngine> fmt::Debug for JobAssert<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobAssert")
            .field("actual", &self.actual)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ProcessEngine> JobAssert<'a, E> {
    pub(crate) fn new(engine: &'a E, actual: Job) -> Self {
        Self { engine, actual }
    }

    pub fn actual(&self) -> &Job {
        &self.actual
    }

    pub async fn has_retries(&self, retries: u32) -> Result<&Self> {
        let current = self.current().await?;
        if current.retries != retries {
            return Err(failure(format!(
                "Expecting {} to have {} retries, but found it to have {}.",
                self.actual, retries, current.retries
            )));
        }
        Ok(self)
    }

    pub async fn has_activity_id(&self, activity_id: &str) -> Result<&Self> {
        let current = self.current().await?;
        if current.activity_id != activity_id {
            return Err(failure(format!(
                "Expecting {} to belong to activity '{}', but found it to belong to '{}'.",
                self.actual, activity_id, current.activity_id
            )));
        }
        Ok(self)
    }

    /// Asserts that the last execution of the job failed with some exception message.
    pub async fn has_exception_message(&self) -> Result<&Self> {
        let current = self.current().await?;
        if current.exception_message.is_none() {
            return Err(failure(format!(
                "Expecting {} to have an exception message, but found none.",
                self.actual
            )));
        }
        Ok(self)
    }

    async fn current(&self) -> Result<Job> {
        tracing::debug!(job = %self.actual.id, "querying current job state");
        let query = JobQuery::new().with_job_id(&self.actual.id);
        self.engine
            .jobs(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                failure(format!(
                    "Expecting {} to be pending, but it has been executed or deleted.",
                    self.actual
                ))
            })
    }
}
