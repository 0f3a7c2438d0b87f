//! Query filters passed to [`ProcessEngine`](crate::ProcessEngine).
//!
//! Queries are plain data so that engine adapters can translate them into
//! whatever their backend speaks (REST parameters, SQL, in-memory scans).
//! Each query also offers [`matches`](EventSubscriptionQuery::matches) for
//! adapters that filter entities themselves. Unset criteria match everything.
//!
//! # Example
//!
//! ```ignore
//! let query = EventSubscriptionQuery::new()
//!     .with_event_type(EventType::Message)
//!     .with_process_instance_id(instance.id());
//! let subscriptions = engine.event_subscriptions(&query).await?;
//! ```

use crate::{
    EventSubscription, EventType, Job, JobId, ProcessDefinitionId, ProcessInstance,
    ProcessInstanceId, Task, TaskId,
};

/// Filter over active event subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSubscriptionQuery {
    event_type: Option<EventType>,
    event_name: Option<String>,
    process_instance_id: Option<ProcessInstanceId>,
}

impl EventSubscriptionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    pub fn with_process_instance_id(mut self, id: &ProcessInstanceId) -> Self {
        self.process_instance_id = Some(id.clone());
        self
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.event_type
    }

    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    pub fn process_instance_id(&self) -> Option<&ProcessInstanceId> {
        self.process_instance_id.as_ref()
    }

    pub fn matches(&self, subscription: &EventSubscription) -> bool {
        self.event_type.is_none_or(|t| t == subscription.event_type)
            && self
                .event_name
                .as_deref()
                .is_none_or(|n| n == subscription.event_name)
            && self
                .process_instance_id
                .as_ref()
                .is_none_or(|id| *id == subscription.process_instance_id)
    }
}

/// Filter over running process instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessInstanceQuery {
    process_instance_id: Option<ProcessInstanceId>,
    process_definition_id: Option<ProcessDefinitionId>,
    business_key: Option<String>,
    active: bool,
}

impl ProcessInstanceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process_instance_id(mut self, id: &ProcessInstanceId) -> Self {
        self.process_instance_id = Some(id.clone());
        self
    }

    pub fn with_process_definition_id(mut self, id: &ProcessDefinitionId) -> Self {
        self.process_definition_id = Some(id.clone());
        self
    }

    pub fn with_business_key(mut self, key: impl Into<String>) -> Self {
        self.business_key = Some(key.into());
        self
    }

    /// Only match instances that are not suspended.
    pub fn with_active_only(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn process_instance_id(&self) -> Option<&ProcessInstanceId> {
        self.process_instance_id.as_ref()
    }

    pub fn process_definition_id(&self) -> Option<&ProcessDefinitionId> {
        self.process_definition_id.as_ref()
    }

    pub fn business_key(&self) -> Option<&str> {
        self.business_key.as_deref()
    }

    pub fn is_active_only(&self) -> bool {
        self.active
    }

    pub fn matches(&self, instance: &ProcessInstance) -> bool {
        self.process_instance_id
            .as_ref()
            .is_none_or(|id| *id == instance.id)
            && self
                .process_definition_id
                .as_ref()
                .is_none_or(|id| *id == instance.process_definition_id)
            && self
                .business_key
                .as_deref()
                .is_none_or(|k| instance.business_key.as_deref() == Some(k))
            && (!self.active || !instance.suspended)
    }
}

/// Filter over open user tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    task_id: Option<TaskId>,
    process_instance_id: Option<ProcessInstanceId>,
    task_definition_key: Option<String>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_id(mut self, id: &TaskId) -> Self {
        self.task_id = Some(id.clone());
        self
    }

    pub fn with_process_instance_id(mut self, id: &ProcessInstanceId) -> Self {
        self.process_instance_id = Some(id.clone());
        self
    }

    pub fn with_task_definition_key(mut self, key: impl Into<String>) -> Self {
        self.task_definition_key = Some(key.into());
        self
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn process_instance_id(&self) -> Option<&ProcessInstanceId> {
        self.process_instance_id.as_ref()
    }

    pub fn task_definition_key(&self) -> Option<&str> {
        self.task_definition_key.as_deref()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.task_id.as_ref().is_none_or(|id| *id == task.id)
            && self
                .process_instance_id
                .as_ref()
                .is_none_or(|id| *id == task.process_instance_id)
            && self
                .task_definition_key
                .as_deref()
                .is_none_or(|k| k == task.task_definition_key)
    }
}

/// Filter over pending jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    job_id: Option<JobId>,
    process_instance_id: Option<ProcessInstanceId>,
    activity_id: Option<String>,
}

impl JobQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_id(mut self, id: &JobId) -> Self {
        self.job_id = Some(id.clone());
        self
    }

    pub fn with_process_instance_id(mut self, id: &ProcessInstanceId) -> Self {
        self.process_instance_id = Some(id.clone());
        self
    }

    pub fn with_activity_id(mut self, id: impl Into<String>) -> Self {
        self.activity_id = Some(id.into());
        self
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn process_instance_id(&self) -> Option<&ProcessInstanceId> {
        self.process_instance_id.as_ref()
    }

    pub fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.job_id.as_ref().is_none_or(|id| *id == job.id)
            && self
                .process_instance_id
                .as_ref()
                .is_none_or(|id| *id == job.process_instance_id)
            && self
                .activity_id
                .as_deref()
                .is_none_or(|a| a == job.activity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubscriptionId;

    fn subscription(name: &str, event_type: EventType, instance: &str) -> EventSubscription {
        EventSubscription {
            id: SubscriptionId::new("sub"),
            event_type,
            event_name: name.to_string(),
            process_instance_id: instance.into(),
            activity_id: "Catch".to_string(),
        }
    }

    #[test]
    fn empty_subscription_query_matches_everything() {
        let query = EventSubscriptionQuery::new();
        assert!(query.matches(&subscription("a", EventType::Signal, "pi-1")));
        assert!(query.matches(&subscription("b", EventType::Message, "pi-2")));
    }

    #[test]
    fn subscription_query_combines_criteria() {
        let query = EventSubscriptionQuery::new()
            .with_event_type(EventType::Message)
            .with_process_instance_id(&"pi-1".into());

        assert!(query.matches(&subscription("a", EventType::Message, "pi-1")));
        assert!(!query.matches(&subscription("a", EventType::Signal, "pi-1")));
        assert!(!query.matches(&subscription("a", EventType::Message, "pi-2")));

        assert_eq!(query.event_type(), Some(EventType::Message));
        assert_eq!(query.process_instance_id(), Some(&"pi-1".into()));
        assert_eq!(query.event_name(), None);
    }

    #[test]
    fn subscription_query_by_name() {
        let query = EventSubscriptionQuery::new().with_event_name("myMessage");
        assert!(query.matches(&subscription("myMessage", EventType::Message, "pi-1")));
        assert!(!query.matches(&subscription("yourMessage", EventType::Message, "pi-1")));
    }

    #[test]
    fn active_instance_query_skips_suspended() {
        let mut instance = ProcessInstance {
            id: "pi-1".into(),
            process_definition_id: "def:1".into(),
            business_key: Some("bk".into()),
            suspended: false,
        };
        let query = ProcessInstanceQuery::new()
            .with_process_definition_id(&"def:1".into())
            .with_business_key("bk")
            .with_active_only();
        assert!(query.matches(&instance));

        instance.suspended = true;
        assert!(!query.matches(&instance));
        assert!(ProcessInstanceQuery::new().matches(&instance));
    }

    #[test]
    fn task_and_job_queries_filter_by_instance() {
        let task = Task {
            id: "t-1".into(),
            process_instance_id: "pi-1".into(),
            task_definition_key: "Approve".into(),
            name: None,
            assignee: None,
        };
        assert!(TaskQuery::new().with_task_definition_key("Approve").matches(&task));
        assert!(!TaskQuery::new().with_process_instance_id(&"pi-2".into()).matches(&task));

        let job = Job {
            id: "j-1".into(),
            process_instance_id: "pi-1".into(),
            activity_id: "Charge".into(),
            retries: 3,
            exception_message: None,
        };
        assert!(JobQuery::new().with_job_id(&"j-1".into()).matches(&job));
        assert!(!JobQuery::new().with_activity_id("Refund").matches(&job));
    }
}
