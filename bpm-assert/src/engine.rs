use std::{collections::BTreeMap, future::Future, sync::Arc};

use crate::{
    EventSubscription, EventSubscriptionQuery, Job, JobQuery, ProcessInstance, ProcessInstanceId,
    ProcessInstanceQuery, Result, Task, TaskQuery,
};

/// Read-only runtime query API of a process engine.
///
/// This is the only surface the assertions depend on. Implement it for an
/// adapter around your engine (REST client, embedded engine, test double);
/// the crate ships [`InMemoryEngine`](crate::memory::InMemoryEngine) behind the
/// `memory-engine` feature.
///
/// Every method reflects the engine state at the time of the call. Callers
/// never cache results across assertions.
///
/// Methods return futures but can be implemented as `async fn` directly.
/// No `#[async_trait]` macro is required.
pub trait ProcessEngine: Send + Sync {
    /// Name under which the engine is registered.
    fn name(&self) -> &str;

    /// Returns the running instance with the given id, or `None` once it has ended.
    fn process_instance(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Option<ProcessInstance>>> + Send {
        let query = ProcessInstanceQuery::new().with_process_instance_id(id);
        async move { Ok(self.process_instances(&query).await?.into_iter().next()) }
    }

    /// Returns all running instances matching the query.
    fn process_instances(
        &self,
        query: &ProcessInstanceQuery,
    ) -> impl Future<Output = Result<Vec<ProcessInstance>>> + Send;

    /// Returns all active event subscriptions matching the query.
    fn event_subscriptions(
        &self,
        query: &EventSubscriptionQuery,
    ) -> impl Future<Output = Result<Vec<EventSubscription>>> + Send;

    /// Returns the ids of activities the instance is currently waiting at.
    fn active_activity_ids(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Returns the ids of activities the instance has completed, in order.
    ///
    /// Returns `None` when the engine does not record activity history.
    fn passed_activity_ids(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Option<Vec<String>>>> + Send;

    /// Returns the process variables visible on the instance.
    fn variables(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<BTreeMap<String, serde_json::Value>>> + Send;

    fn tasks(&self, query: &TaskQuery) -> impl Future<Output = Result<Vec<Task>>> + Send;

    fn jobs(&self, query: &JobQuery) -> impl Future<Output = Result<Vec<Job>>> + Send;
}

impl<E: ProcessEngine> ProcessEngine for Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn process_instance(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Option<ProcessInstance>>> + Send {
        (**self).process_instance(id)
    }

    fn process_instances(
        &self,
        query: &ProcessInstanceQuery,
    ) -> impl Future<Output = Result<Vec<ProcessInstance>>> + Send {
        (**self).process_instances(query)
    }

    fn event_subscriptions(
        &self,
        query: &EventSubscriptionQuery,
    ) -> impl Future<Output = Result<Vec<EventSubscription>>> + Send {
        (**self).event_subscriptions(query)
    }

    fn active_activity_ids(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Vec<String>>> + Send {
        (**self).active_activity_ids(id)
    }

    fn passed_activity_ids(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<Option<Vec<String>>>> + Send {
        (**self).passed_activity_ids(id)
    }

    fn variables(
        &self,
        id: &ProcessInstanceId,
    ) -> impl Future<Output = Result<BTreeMap<String, serde_json::Value>>> + Send {
        (**self).variables(id)
    }

    fn tasks(&self, query: &TaskQuery) -> impl Future<Output = Result<Vec<Task>>> + Send {
        (**self).tasks(query)
    }

    fn jobs(&self, query: &JobQuery) -> impl Future<Output = Result<Vec<Job>>> + Send {
        (**self).jobs(query)
    }
}
