//! Read-only views of engine entities.
//!
//! These are handles returned by an engine's query API. They are not owned by
//! this library and carry no live state: assertions always re-query the engine
//! for the current situation instead of trusting fields captured earlier.

use std::fmt;

use crate::{JobId, ProcessDefinitionId, ProcessInstanceId, SubscriptionId, TaskId};

/// A deployed version of a process model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessDefinition {
    pub id: ProcessDefinitionId,
    pub key: String,
    pub name: Option<String>,
    pub version: u32,
}

impl fmt::Display for ProcessDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessDefinition {{id: '{}', key: '{}', version: {}}}",
            self.id, self.key, self.version
        )
    }
}

/// A handle to a process instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessInstance {
    pub id: ProcessInstanceId,
    pub process_definition_id: ProcessDefinitionId,
    pub business_key: Option<String>,
    pub suspended: bool,
}

impl ProcessInstance {
    #[inline]
    pub fn id(&self) -> &ProcessInstanceId {
        &self.id
    }
}

impl fmt::Display for ProcessInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessInstance {{id: '{}', processDefinitionId: '{}'",
            self.id, self.process_definition_id
        )?;
        if let Some(key) = &self.business_key {
            write!(f, ", businessKey: '{key}'")?;
        }
        write!(f, "}}")
    }
}

/// A user task waiting for completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub id: TaskId,
    pub process_instance_id: ProcessInstanceId,
    /// Activity id of the task in the process model.
    pub task_definition_key: String,
    pub name: Option<String>,
    pub assignee: Option<String>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task {{id: '{}', taskDefinitionKey: '{}', processInstanceId: '{}'}}",
            self.id, self.task_definition_key, self.process_instance_id
        )
    }
}

/// An executable unit of work (async continuation, timer, service call).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub id: JobId,
    pub process_instance_id: ProcessInstanceId,
    pub activity_id: String,
    pub retries: u32,
    pub exception_message: Option<String>,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job {{id: '{}', activityId: '{}', processInstanceId: '{}'}}",
            self.id, self.activity_id, self.process_instance_id
        )
    }
}

/// Kind of event an instance can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    Message,
    Signal,
    Compensate,
    Conditional,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Message => "message",
            EventType::Signal => "signal",
            EventType::Compensate => "compensate",
            EventType::Conditional => "conditional",
        };
        f.write_str(s)
    }
}

/// The engine's record that an instance is waiting for a named event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventSubscription {
    pub id: SubscriptionId,
    pub event_type: EventType,
    pub event_name: String,
    pub process_instance_id: ProcessInstanceId,
    pub activity_id: String,
}
