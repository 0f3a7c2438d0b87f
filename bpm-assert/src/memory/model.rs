use std::collections::HashSet;

use crate::{Error, Result};

/// A process model for the in-memory engine.
///
/// A model is a start event, a sequence of stages and an end event. Each
/// stage is a set of wait states entered together (a parallel split); the
/// instance moves to the next stage once every wait state of the current one
/// has been resolved. After the last stage the instance ends.
///
/// # Example
///
/// ```rust
/// use bpm_assert::memory::{ProcessModel, WaitState};
///
/// // Waits for two messages in parallel, then for a user task.
/// let model = ProcessModel::new("order-fulfilment")
///     .name("Order fulfilment")
///     .stage([
///         WaitState::message("ReceivePayment", "paymentReceived"),
///         WaitState::message("ReceiveStock", "stockReserved"),
///     ])
///     .then(WaitState::user_task("ShipOrder", "Ship order").assigned_to("fozzie"));
/// assert_eq!(model.key(), "order-fulfilment");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessModel {
    key: String,
    name: Option<String>,
    start_event: String,
    end_event: String,
    stages: Vec<Vec<WaitState>>,
}

impl ProcessModel {
    pub const DEFAULT_START_EVENT: &'static str = "StartEvent";
    pub const DEFAULT_END_EVENT: &'static str = "EndEvent";

    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            start_event: Self::DEFAULT_START_EVENT.to_string(),
            end_event: Self::DEFAULT_END_EVENT.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn start_event(mut self, activity_id: impl Into<String>) -> Self {
        self.start_event = activity_id.into();
        self
    }

    pub fn end_event(mut self, activity_id: impl Into<String>) -> Self {
        self.end_event = activity_id.into();
        self
    }

    /// Append a stage of wait states entered in parallel.
    pub fn stage(mut self, wait_states: impl IntoIterator<Item = WaitState>) -> Self {
        self.stages.push(wait_states.into_iter().collect());
        self
    }

    /// Append a stage with a single wait state.
    pub fn then(self, wait_state: WaitState) -> Self {
        self.stage([wait_state])
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn start_event_id(&self) -> &str {
        &self.start_event
    }

    pub(crate) fn end_event_id(&self) -> &str {
        &self.end_event
    }

    pub(crate) fn stages(&self) -> &[Vec<WaitState>] {
        &self.stages
    }

    /// Rejects models the engine cannot run unambiguously.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::illegal_argument("Process model key must not be empty."));
        }
        let mut seen = HashSet::new();
        let ids = std::iter::once(self.start_event.as_str())
            .chain(std::iter::once(self.end_event.as_str()))
            .chain(self.stages.iter().flatten().map(|w| w.activity_id.as_str()));
        for id in ids {
            if !seen.insert(id) {
                return Err(Error::illegal_argument(format!(
                    "Process model '{}' declares activity '{}' more than once.",
                    self.key, id
                )));
            }
        }
        if let Some(i) = self.stages.iter().position(Vec::is_empty) {
            return Err(Error::illegal_argument(format!(
                "Process model '{}' has an empty stage at position {}.",
                self.key, i
            )));
        }
        Ok(())
    }
}

/// A point where an instance pauses until something external happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitState {
    pub(crate) activity_id: String,
    pub(crate) kind: WaitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitKind {
    /// Intermediate message catch event; resolved by message correlation.
    Message { message_name: String },
    /// User task; resolved by completing the task.
    UserTask {
        name: String,
        assignee: Option<String>,
    },
    /// Asynchronous job; resolved by executing it.
    Job,
}

impl WaitState {
    pub fn message(activity_id: impl Into<String>, message_name: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            kind: WaitKind::Message {
                message_name: message_name.into(),
            },
        }
    }

    pub fn user_task(activity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            kind: WaitKind::UserTask {
                name: name.into(),
                assignee: None,
            },
        }
    }

    pub fn job(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            kind: WaitKind::Job,
        }
    }

    /// Pre-assign a user task. Has no effect on other wait states.
    pub fn assigned_to(mut self, user_id: impl Into<String>) -> Self {
        if let WaitKind::UserTask { assignee, .. } = &mut self.kind {
            *assignee = Some(user_id.into());
        }
        self
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_stages_in_order() {
        let model = ProcessModel::new("p")
            .then(WaitState::message("A", "a"))
            .stage([WaitState::job("B"), WaitState::user_task("C", "c")]);
        let ids: Vec<Vec<&str>> = model
            .stages()
            .iter()
            .map(|s| s.iter().map(WaitState::activity_id).collect())
            .collect();
        assert_eq!(ids, vec![vec!["A"], vec!["B", "C"]]);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn duplicate_activity_ids_are_rejected() {
        let model = ProcessModel::new("p")
            .then(WaitState::message("A", "a"))
            .then(WaitState::job("A"));
        assert!(model.validate().unwrap_err().is_illegal_argument());
    }

    #[test]
    fn activity_colliding_with_start_event_is_rejected() {
        let model = ProcessModel::new("p").then(WaitState::job(ProcessModel::DEFAULT_START_EVENT));
        assert!(model.validate().is_err());
    }

    #[test]
    fn empty_stage_and_empty_key_are_rejected() {
        assert!(ProcessModel::new("p").stage(Vec::new()).validate().is_err());
        assert!(ProcessModel::new("").validate().is_err());
    }

    #[test]
    fn assigned_to_only_affects_user_tasks() {
        let task = WaitState::user_task("T", "Task").assigned_to("kermit");
        assert_eq!(
            task.kind,
            WaitKind::UserTask {
                name: "Task".into(),
                assignee: Some("kermit".into())
            }
        );
        assert_eq!(WaitState::job("J").assigned_to("kermit").kind, WaitKind::Job);
    }
}
