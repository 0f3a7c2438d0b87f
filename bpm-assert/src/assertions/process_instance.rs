use std::fmt;

use crate::{
    EventSubscriptionQuery, EventType, JobQuery, ProcessEngine, ProcessInstance, Result,
    TaskQuery,
    args::{IntoNames, optional_names, require_names},
    assertions::{JobAssert, TaskAssert, failure, list},
    error::Error,
};

/// Assertions on a single process instance.
///
/// Created by [`ProcessEngineAssertions::process_instance`](crate::ProcessEngineAssertions::process_instance).
/// Each method re-queries the engine and returns `Ok(&Self)` on success so
/// assertions chain:
///
/// ```ignore
/// assertions
///     .process_instance(&instance)
///     .is_not_ended()
///     .await?
///     .is_waiting_at("ReviewInvoice")
///     .await?
///     .has_passed(["StartEvent", "ScanInvoice"])
///     .await?;
/// ```
pub struct ProcessInstanceAssert<'a, E: ProcessEngine> {
    engine: &'a E,
    actual: ProcessInstance,
}

impl<E: ProcessEngine> fmt::Debug for ProcessInstanceAssert<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessInstanceAssert")
            .field("actual", &self.actual)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ProcessEngine> ProcessInstanceAssert<'a, E> {
    pub(crate) fn new(engine: &'a E, actual: ProcessInstance) -> Self {
        Self { engine, actual }
    }

    /// Returns the process instance under test.
    pub fn actual(&self) -> &ProcessInstance {
        &self.actual
    }

    // ==================== Message subscriptions ====================

    /// Asserts that the instance is not waiting for any of the given messages.
    ///
    /// Fails on the first name the instance currently holds a message
    /// subscription for. An ended instance waits for nothing, so the
    /// assertion passes for it.
    ///
    /// # Errors
    ///
    /// - [`Error::IllegalArgument`] if `message_names` is absent, empty or has
    ///   an absent entry. Checked before the engine is queried.
    /// - [`Error::AssertionFailed`] if the instance waits for one of the messages.
    pub async fn is_not_waiting_for(&self, message_names: impl IntoNames) -> Result<&Self> {
        let expected = require_names(message_names, "messageNames")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "is_not_waiting_for");

        let waiting_for = self.waiting_for().await?;
        for name in &expected {
            if waiting_for.contains(name) {
                return Err(failure(format!(
                    "Expecting {} not to be waiting for message '{}', but it is actually waiting for {}.",
                    self.actual,
                    name,
                    list(&waiting_for)
                )));
            }
        }
        Ok(self)
    }

    /// Asserts that the instance is waiting for every one of the given messages.
    ///
    /// # Errors
    ///
    /// Same argument rules as [`is_not_waiting_for`](Self::is_not_waiting_for);
    /// [`Error::AssertionFailed`] for the first message without a subscription.
    pub async fn is_waiting_for(&self, message_names: impl IntoNames) -> Result<&Self> {
        let expected = require_names(message_names, "messageNames")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "is_waiting_for");

        let waiting_for = self.waiting_for().await?;
        if let Some(name) = expected.iter().find(|n| !waiting_for.contains(n)) {
            return Err(failure(format!(
                "Expecting {} to be waiting for message '{}', but it is actually waiting for {}.",
                self.actual,
                name,
                list(&waiting_for)
            )));
        }
        Ok(self)
    }

    /// Names of messages the instance currently holds a subscription for.
    async fn waiting_for(&self) -> Result<Vec<String>> {
        let query = EventSubscriptionQuery::new()
            .with_event_type(EventType::Message)
            .with_process_instance_id(&self.actual.id);
        let mut names: Vec<String> = self
            .engine
            .event_subscriptions(&query)
            .await?
            .into_iter()
            .map(|s| s.event_name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    // ==================== Wait states ====================

    /// Asserts that the instance is currently waiting at all the given activities.
    pub async fn is_waiting_at(&self, activity_ids: impl IntoNames) -> Result<&Self> {
        let expected = require_names(activity_ids, "activityIds")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "is_waiting_at");

        let active = self.engine.active_activity_ids(&self.actual.id).await?;
        if let Some(id) = expected.iter().find(|id| !active.contains(id)) {
            return Err(failure(format!(
                "Expecting {} to be waiting at '{}', but it is actually waiting at {}.",
                self.actual,
                id,
                list(&active)
            )));
        }
        Ok(self)
    }

    /// Asserts that the instance is not waiting at any of the given activities.
    pub async fn is_not_waiting_at(&self, activity_ids: impl IntoNames) -> Result<&Self> {
        let expected = require_names(activity_ids, "activityIds")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "is_not_waiting_at");

        let active = self.engine.active_activity_ids(&self.actual.id).await?;
        if let Some(id) = expected.iter().find(|id| active.contains(id)) {
            return Err(failure(format!(
                "Expecting {} not to be waiting at '{}', but it is actually waiting at {}.",
                self.actual,
                id,
                list(&active)
            )));
        }
        Ok(self)
    }

    // ==================== Lifecycle ====================

    /// Asserts that the instance has ended.
    pub async fn is_ended(&self) -> Result<&Self> {
        tracing::debug!(process_instance = %self.actual.id, "is_ended");
        if self.current().await?.is_some() {
            return Err(failure(format!(
                "Expecting {} to be ended, but it is still running.",
                self.actual
            )));
        }
        Ok(self)
    }

    /// Asserts that the instance is still running (active or suspended).
    pub async fn is_not_ended(&self) -> Result<&Self> {
        tracing::debug!(process_instance = %self.actual.id, "is_not_ended");
        if self.current().await?.is_none() {
            return Err(failure(format!(
                "Expecting {} not to be ended, but it is.",
                self.actual
            )));
        }
        Ok(self)
    }

    /// Asserts that the instance is running and not suspended.
    pub async fn is_active(&self) -> Result<&Self> {
        tracing::debug!(process_instance = %self.actual.id, "is_active");
        match self.current().await? {
            None => Err(failure(format!(
                "Expecting {} to be active, but it has ended.",
                self.actual
            ))),
            Some(current) if current.suspended => Err(failure(format!(
                "Expecting {} to be active, but it is suspended.",
                self.actual
            ))),
            Some(_) => Ok(self),
        }
    }

    /// Asserts that the instance is running but suspended.
    pub async fn is_suspended(&self) -> Result<&Self> {
        tracing::debug!(process_instance = %self.actual.id, "is_suspended");
        match self.current().await? {
            None => Err(failure(format!(
                "Expecting {} to be suspended, but it has ended.",
                self.actual
            ))),
            Some(current) if !current.suspended => Err(failure(format!(
                "Expecting {} to be suspended, but it is active.",
                self.actual
            ))),
            Some(_) => Ok(self),
        }
    }

    async fn current(&self) -> Result<Option<ProcessInstance>> {
        self.engine.process_instance(&self.actual.id).await
    }

    // ==================== History ====================

    /// Asserts that the instance has completed all the given activities.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] if the engine records no activity history.
    pub async fn has_passed(&self, activity_ids: impl IntoNames) -> Result<&Self> {
        let expected = require_names(activity_ids, "activityIds")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "has_passed");

        let passed = self.passed().await?;
        if let Some(id) = expected.iter().find(|id| !passed.contains(id)) {
            return Err(failure(format!(
                "Expecting {} to have passed '{}', but it actually passed {}.",
                self.actual,
                id,
                list(&passed)
            )));
        }
        Ok(self)
    }

    /// Asserts that the instance has completed none of the given activities.
    pub async fn has_not_passed(&self, activity_ids: impl IntoNames) -> Result<&Self> {
        let expected = require_names(activity_ids, "activityIds")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "has_not_passed");

        let passed = self.passed().await?;
        if let Some(id) = expected.iter().find(|id| passed.contains(id)) {
            return Err(failure(format!(
                "Expecting {} not to have passed '{}', but it actually passed {}.",
                self.actual,
                id,
                list(&passed)
            )));
        }
        Ok(self)
    }

    async fn passed(&self) -> Result<Vec<String>> {
        self.engine
            .passed_activity_ids(&self.actual.id)
            .await?
            .ok_or_else(|| {
                Error::illegal_state(format!(
                    "Cannot check passed activities of {}: the engine records no activity history.",
                    self.actual
                ))
            })
    }

    // ==================== Variables ====================

    /// Asserts that the instance holds the given variables.
    ///
    /// With an empty list, asserts that it holds at least one variable.
    pub async fn has_variables(&self, names: impl IntoNames) -> Result<&Self> {
        let expected = optional_names(names, "variableNames")?;
        tracing::debug!(process_instance = %self.actual.id, expected = ?expected, "has_variables");

        let variables = self.engine.variables(&self.actual.id).await?;
        let present: Vec<&String> = variables.keys().collect();
        if expected.is_empty() && variables.is_empty() {
            return Err(failure(format!(
                "Expecting {} to hold process variables, but it holds none.",
                self.actual
            )));
        }
        if let Some(name) = expected.iter().find(|n| !variables.contains_key(*n)) {
            return Err(failure(format!(
                "Expecting {} to hold process variable '{}', but it actually holds {}.",
                self.actual,
                name,
                list(&present)
            )));
        }
        Ok(self)
    }

    /// Asserts that the instance holds no variables at all.
    pub async fn has_no_variables(&self) -> Result<&Self> {
        tracing::debug!(process_instance = %self.actual.id, "has_no_variables");
        let variables = self.engine.variables(&self.actual.id).await?;
        if !variables.is_empty() {
            let present: Vec<&String> = variables.keys().collect();
            return Err(failure(format!(
                "Expecting {} to hold no process variables, but it actually holds {}.",
                self.actual,
                list(&present)
            )));
        }
        Ok(self)
    }

    // ==================== Navigation ====================

    /// Returns assertions for the single open task of this instance.
    ///
    /// Fails if the instance has no open task or more than one.
    pub async fn task(&self) -> Result<TaskAssert<'a, E>> {
        let query = TaskQuery::new().with_process_instance_id(&self.actual.id);
        let mut tasks = self.engine.tasks(&query).await?;
        match tasks.len() {
            1 => Ok(TaskAssert::new(self.engine, tasks.remove(0))),
            0 => Err(failure(format!(
                "Expecting {} to have exactly one open task, but it has none.",
                self.actual
            ))),
            n => {
                let keys: Vec<&str> = tasks.iter().map(|t| t.task_definition_key.as_str()).collect();
                Err(failure(format!(
                    "Expecting {} to have exactly one open task, but it has {n}: {}.",
                    self.actual,
                    list(&keys)
                )))
            }
        }
    }

    /// Returns assertions for the single pending job of this instance.
    ///
    /// Fails if the instance has no pending job or more than one.
    pub async fn job(&self) -> Result<JobAssert<'a, E>> {
        let query = JobQuery::new().with_process_instance_id(&self.actual.id);
        let mut jobs = self.engine.jobs(&query).await?;
        match jobs.len() {
            1 => Ok(JobAssert::new(self.engine, jobs.remove(0))),
            0 => Err(failure(format!(
                "Expecting {} to have exactly one pending job, but it has none.",
                self.actual
            ))),
            n => {
                let ids: Vec<&str> = jobs.iter().map(|j| j.activity_id.as_str()).collect();
                Err(failure(format!(
                    "Expecting {} to have exactly one pending job, but it has {n}: {}.",
                    self.actual,
                    list(&ids)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        EventSubscription, Job, ProcessEngineAssertions, ProcessInstanceId, ProcessInstanceQuery,
        SubscriptionId, Task,
    };

    /// Engine serving a fixed set of message subscriptions and counting queries.
    #[derive(Default)]
    struct FixedEngine {
        messages: Vec<&'static str>,
        /// Served alongside `messages`, for any event type or instance.
        others: Vec<EventSubscription>,
        queries: AtomicUsize,
    }

    impl FixedEngine {
        fn waiting_for(messages: &[&'static str]) -> Self {
            Self {
                messages: messages.to_vec(),
                ..Default::default()
            }
        }

        fn with_subscription(mut self, event_type: EventType, name: &str, instance: &str) -> Self {
            self.others.push(EventSubscription {
                id: SubscriptionId::new(name),
                event_type,
                event_name: name.to_string(),
                process_instance_id: instance.into(),
                activity_id: format!("Catch_{name}"),
            });
            self
        }
    }

    impl ProcessEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn process_instances(&self, _: &ProcessInstanceQuery) -> Result<Vec<ProcessInstance>> {
            Ok(vec![instance()])
        }

        async fn event_subscriptions(
            &self,
            query: &EventSubscriptionQuery,
        ) -> Result<Vec<EventSubscription>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .messages
                .iter()
                .map(|name| EventSubscription {
                    id: SubscriptionId::new(name),
                    event_type: EventType::Message,
                    event_name: name.to_string(),
                    process_instance_id: instance().id,
                    activity_id: format!("Catch_{name}"),
                })
                .chain(self.others.iter().cloned())
                .filter(|s| query.matches(s))
                .collect())
        }

        async fn active_activity_ids(&self, _: &ProcessInstanceId) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn passed_activity_ids(&self, _: &ProcessInstanceId) -> Result<Option<Vec<String>>> {
            Ok(None)
        }

        async fn variables(
            &self,
            _: &ProcessInstanceId,
        ) -> Result<BTreeMap<String, serde_json::Value>> {
            Ok(BTreeMap::new())
        }

        async fn tasks(&self, _: &TaskQuery) -> Result<Vec<Task>> {
            Ok(Vec::new())
        }

        async fn jobs(&self, _: &JobQuery) -> Result<Vec<Job>> {
            Ok(Vec::new())
        }
    }

    fn instance() -> ProcessInstance {
        ProcessInstance {
            id: "pi-1".into(),
            process_definition_id: "messages:1:abc".into(),
            business_key: None,
            suspended: false,
        }
    }

    #[tokio::test]
    async fn not_waiting_for_unsubscribed_message_succeeds() {
        let engine = FixedEngine::waiting_for(&["myMessage"]);
        let assertions = ProcessEngineAssertions::new(&engine);
        assertions
            .process_instance(&instance())
            .is_not_waiting_for("yourMessage")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn waiting_for_one_of_the_messages_fails_with_instance_and_message() {
        let engine = FixedEngine::waiting_for(&["myMessage"]);
        let assertions = ProcessEngineAssertions::new(&engine);
        let err = assertions
            .process_instance(&instance())
            .is_not_waiting_for(["yourMessage", "myMessage"])
            .await
            .unwrap_err();

        assert!(err.is_assertion_failure());
        assert_eq!(
            err.to_string(),
            "Expecting ProcessInstance {id: 'pi-1', processDefinitionId: 'messages:1:abc'} \
             not to be waiting for message 'myMessage', but it is actually waiting for [myMessage]."
        );
    }

    #[tokio::test]
    async fn only_message_subscriptions_count() {
        let engine = FixedEngine::default()
            .with_subscription(EventType::Signal, "myMessage", "pi-1")
            .with_subscription(EventType::Conditional, "yourMessage", "pi-1");
        let assertions = ProcessEngineAssertions::new(&engine);
        assertions
            .process_instance(&instance())
            .is_not_waiting_for(["myMessage", "yourMessage"])
            .await
            .unwrap();
        assert!(
            assertions
                .process_instance(&instance())
                .is_waiting_for("myMessage")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn subscriptions_of_other_instances_are_ignored() {
        let engine =
            FixedEngine::default().with_subscription(EventType::Message, "myMessage", "pi-2");
        ProcessEngineAssertions::new(&engine)
            .process_instance(&instance())
            .is_not_waiting_for("myMessage")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn misuse_is_rejected_before_querying() {
        let engine = FixedEngine::default();
        let assertions = ProcessEngineAssertions::new(&engine);
        let subject = assertions.process_instance(&instance());

        let empty = subject.is_not_waiting_for(Vec::<&str>::new()).await.unwrap_err();
        let absent = subject.is_not_waiting_for(None::<&str>).await.unwrap_err();
        let absent_entry = subject
            .is_not_waiting_for([Some("myMessage"), None])
            .await
            .unwrap_err();

        assert!(empty.is_illegal_argument());
        assert!(absent.is_illegal_argument());
        assert!(absent_entry.is_illegal_argument());
        assert_eq!(engine.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn each_call_queries_the_engine() {
        let engine = FixedEngine::default();
        let assertions = ProcessEngineAssertions::new(&engine);
        assertions
            .process_instance(&instance())
            .is_not_waiting_for("a")
            .await
            .unwrap()
            .is_not_waiting_for("b")
            .await
            .unwrap();
        assert_eq!(engine.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn is_waiting_for_requires_every_message() {
        let engine = FixedEngine::waiting_for(&["myMessage", "yourMessage"]);
        let assertions = ProcessEngineAssertions::new(&engine);
        let subject = assertions.process_instance(&instance());

        subject
            .is_waiting_for(["myMessage", "yourMessage"])
            .await
            .unwrap();
        let err = subject
            .is_waiting_for(["myMessage", "theirMessage"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("to be waiting for message 'theirMessage'"));
    }

    #[tokio::test]
    async fn has_passed_without_history_is_illegal_state() {
        let engine = FixedEngine::default();
        let assertions = ProcessEngineAssertions::new(&engine);
        let err = assertions
            .process_instance(&instance())
            .has_passed("StartEvent")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IllegalState(_)));
    }

    #[tokio::test]
    async fn task_navigation_fails_without_open_task() {
        let engine = FixedEngine::default();
        let assertions = ProcessEngineAssertions::new(&engine);
        let err = assertions
            .process_instance(&instance())
            .task()
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("to have exactly one open task, but it has none."));
    }
}
