//! In-memory process engine for driving assertions in tests.
//!
//! Enable with the `memory-engine` feature (on by default).
//!
//! The engine runs [`ProcessModel`]s: sequences of wait-state stages declared
//! in Rust. It keeps just enough runtime state (message subscriptions, user
//! tasks, jobs, variables, activity history) to exercise every assertion in
//! this crate. It does not parse or execute BPMN.
//!
//! # Example
//!
//! ```ignore
//! let engine = InMemoryEngine::default();
//! engine
//!     .deploy(ProcessModel::new("invoice").then(WaitState::message("WaitForPayment", "paid")))
//!     .await?;
//!
//! let instance = engine.start_process_instance_by_key("invoice").await?;
//! engine.correlate_message("paid").await?;
//!
//! ProcessEngineAssertions::new(&engine)
//!     .process_instance(&instance)
//!     .is_not_waiting_for("paid")
//!     .await?
//!     .is_ended()
//!     .await?;
//! ```
//!
//! # Warning
//!
//! **Do not use in production.** Instances and history are kept in memory
//! for the lifetime of the engine and are never purged.

mod model;

pub use model::{ProcessModel, WaitState};

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use tokio::sync::RwLock;

use crate::{
    EngineConfig, Error, EventSubscription, EventSubscriptionQuery, EventType, Job, JobId,
    JobQuery, ProcessDefinition, ProcessDefinitionId, ProcessEngine, ProcessInstance,
    ProcessInstanceId, ProcessInstanceQuery, Result, SubscriptionId, Task, TaskId, TaskQuery,
};
use model::WaitKind;

/// An in-memory [`ProcessEngine`] with the commands tests need to move
/// instances between wait states.
pub struct InMemoryEngine {
    config: EngineConfig,
    state: RwLock<State>,
}

impl fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[derive(Default)]
struct State {
    /// Deployed versions per definition key, oldest first.
    definitions: HashMap<String, Vec<Deployment>>,
    instances: BTreeMap<ProcessInstanceId, Execution>,
    /// Passed activities per instance; kept after the instance ends.
    history: HashMap<ProcessInstanceId, Vec<String>>,
}

struct Deployment {
    definition: ProcessDefinition,
    model: Arc<ProcessModel>,
}

/// Runtime state of one running instance.
struct Execution {
    instance: ProcessInstance,
    model: Arc<ProcessModel>,
    stage: usize,
    pending: Vec<Pending>,
    variables: BTreeMap<String, serde_json::Value>,
}

/// An unresolved wait state of the current stage.
enum Pending {
    Message(EventSubscription),
    Task(Task),
    Job(Job),
}

impl Pending {
    fn activity_id(&self) -> &str {
        match self {
            Pending::Message(s) => &s.activity_id,
            Pending::Task(t) => &t.task_definition_key,
            Pending::Job(j) => &j.activity_id,
        }
    }
}

impl InMemoryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Repository ====================

    /// Deploy a model. Deploying the same key again creates a new version;
    /// new instances start from the latest one.
    pub async fn deploy(&self, model: ProcessModel) -> Result<ProcessDefinition> {
        model.validate()?;
        let mut state = self.state.write().await;
        let versions = state.definitions.entry(model.key().to_string()).or_default();
        let version = versions.len() as u32 + 1;
        let definition = ProcessDefinition {
            id: ProcessDefinitionId::from(format!(
                "{}:{}:{}",
                model.key(),
                version,
                uuid::Uuid::new_v4()
            )),
            key: model.key().to_string(),
            name: model.display_name().map(str::to_string),
            version,
        };
        tracing::debug!(definition = %definition.id, "deployed process model");
        versions.push(Deployment {
            definition: definition.clone(),
            model: Arc::new(model),
        });
        Ok(definition)
    }

    // ==================== Starting instances ====================

    pub async fn start_process_instance_by_key(&self, key: &str) -> Result<ProcessInstance> {
        self.start(key, None, BTreeMap::new()).await
    }

    pub async fn start_process_instance_with_business_key(
        &self,
        key: &str,
        business_key: &str,
    ) -> Result<ProcessInstance> {
        self.start(key, Some(business_key.to_string()), BTreeMap::new())
            .await
    }

    pub async fn start_process_instance_with_variables<I, K>(
        &self,
        key: &str,
        variables: I,
    ) -> Result<ProcessInstance>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        let variables = variables.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.start(key, None, variables).await
    }

    async fn start(
        &self,
        key: &str,
        business_key: Option<String>,
        variables: BTreeMap<String, serde_json::Value>,
    ) -> Result<ProcessInstance> {
        let mut state = self.state.write().await;
        let deployment = state
            .definitions
            .get(key)
            .and_then(|versions| versions.last())
            .ok_or_else(|| Error::UnknownProcessDefinition(key.to_string()))?;

        let instance = ProcessInstance {
            id: ProcessInstanceId::generate(),
            process_definition_id: deployment.definition.id.clone(),
            business_key,
            suspended: false,
        };
        let model = deployment.model.clone();
        tracing::debug!(process_instance = %instance.id, key, "starting process instance");

        let id = instance.id.clone();
        state.pass(&id, model.start_event_id(), self.config.history_enabled());
        state.instances.insert(
            id.clone(),
            Execution {
                instance: instance.clone(),
                model,
                stage: 0,
                pending: Vec::new(),
                variables,
            },
        );
        state.enter_stage(&id, &self.config);
        Ok(instance)
    }

    // ==================== Commands ====================

    /// Deliver a message to the single instance waiting for it.
    ///
    /// # Errors
    ///
    /// [`Error::MismatchingCorrelation`] unless exactly one active (not
    /// suspended) instance holds a subscription for `message_name`.
    pub async fn correlate_message(&self, message_name: &str) -> Result<ProcessInstanceId> {
        let mut state = self.state.write().await;
        let matches: Vec<(ProcessInstanceId, String)> = state
            .instances
            .values()
            .filter(|e| !e.instance.suspended)
            .flat_map(|e| {
                e.pending.iter().filter_map(move |p| match p {
                    Pending::Message(s) if s.event_name == message_name => {
                        Some((e.instance.id.clone(), s.activity_id.clone()))
                    }
                    _ => None,
                })
            })
            .collect();

        let [(id, activity_id)] = matches.as_slice() else {
            return Err(Error::MismatchingCorrelation {
                message: message_name.to_string(),
                matches: matches.len(),
            });
        };
        tracing::debug!(process_instance = %id, message = message_name, "correlated message");
        state.resolve(id, activity_id, &self.config);
        Ok(id.clone())
    }

    /// Claim a user task for a user, replacing any previous assignee.
    pub async fn claim(&self, task_id: &TaskId, user_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let (instance_id, index) = state
            .find(|p| matches!(p, Pending::Task(t) if t.id == *task_id))
            .ok_or_else(|| not_found("Task", task_id))?;
        let execution = state.running_mut(&instance_id)?;
        if let Pending::Task(task) = &mut execution.pending[index] {
            task.assignee = Some(user_id.to_string());
            tracing::debug!(task = %task_id, user_id, "claimed task");
        }
        Ok(())
    }

    pub async fn complete_task(&self, task_id: &TaskId) -> Result<()> {
        let mut state = self.state.write().await;
        let (instance_id, index) = state
            .find(|p| matches!(p, Pending::Task(t) if t.id == *task_id))
            .ok_or_else(|| not_found("Task", task_id))?;
        let activity_id = state.running_mut(&instance_id)?.pending[index]
            .activity_id()
            .to_string();
        tracing::debug!(process_instance = %instance_id, task = %task_id, "completing task");
        state.resolve(&instance_id, &activity_id, &self.config);
        Ok(())
    }

    /// Run a job successfully, moving its instance past the job's activity.
    pub async fn execute_job(&self, job_id: &JobId) -> Result<()> {
        let mut state = self.state.write().await;
        let (instance_id, index) = state
            .find(|p| matches!(p, Pending::Job(j) if j.id == *job_id))
            .ok_or_else(|| not_found("Job", job_id))?;
        let activity_id = match &state.running_mut(&instance_id)?.pending[index] {
            Pending::Job(job) if job.retries == 0 => {
                return Err(Error::illegal_state(format!("{job} has no retries left.")));
            }
            pending => pending.activity_id().to_string(),
        };
        tracing::debug!(process_instance = %instance_id, job = %job_id, "executing job");
        state.resolve(&instance_id, &activity_id, &self.config);
        Ok(())
    }

    /// Record a failed execution of a job: retries drop by one and the
    /// exception message is kept. The instance stays at the job's activity.
    pub async fn fail_job(&self, job_id: &JobId, exception_message: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let (instance_id, index) = state
            .find(|p| matches!(p, Pending::Job(j) if j.id == *job_id))
            .ok_or_else(|| not_found("Job", job_id))?;
        let execution = state.running_mut(&instance_id)?;
        if let Pending::Job(job) = &mut execution.pending[index] {
            if job.retries == 0 {
                return Err(Error::illegal_state(format!("{job} has no retries left.")));
            }
            job.retries -= 1;
            job.exception_message = Some(exception_message.to_string());
            tracing::debug!(job = %job_id, retries = job.retries, "job execution failed");
        }
        Ok(())
    }

    pub async fn suspend(&self, id: &ProcessInstanceId) -> Result<()> {
        self.set_suspended(id, true).await
    }

    pub async fn activate(&self, id: &ProcessInstanceId) -> Result<()> {
        self.set_suspended(id, false).await
    }

    async fn set_suspended(&self, id: &ProcessInstanceId, suspended: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let execution = state
            .instances
            .get_mut(id)
            .ok_or_else(|| not_found("ProcessInstance", id))?;
        execution.instance.suspended = suspended;
        tracing::debug!(process_instance = %id, suspended, "changed suspension state");
        Ok(())
    }

    pub async fn set_variable(
        &self,
        id: &ProcessInstanceId,
        name: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .running_mut(id)?
            .variables
            .insert(name.to_string(), value);
        Ok(())
    }
}

impl State {
    /// Record an activity as passed.
    fn pass(&mut self, id: &ProcessInstanceId, activity_id: &str, history_enabled: bool) {
        if history_enabled {
            self.history
                .entry(id.clone())
                .or_default()
                .push(activity_id.to_string());
        }
    }

    /// Locate a pending wait state across all running instances.
    fn find(&self, predicate: impl Fn(&Pending) -> bool) -> Option<(ProcessInstanceId, usize)> {
        self.instances.iter().find_map(|(id, e)| {
            e.pending
                .iter()
                .position(&predicate)
                .map(|index| (id.clone(), index))
        })
    }

    /// Returns the execution if it is running and not suspended.
    fn running_mut(&mut self, id: &ProcessInstanceId) -> Result<&mut Execution> {
        let execution = self
            .instances
            .get_mut(id)
            .ok_or_else(|| not_found("ProcessInstance", id))?;
        if execution.instance.suspended {
            return Err(Error::illegal_state(format!(
                "{} is suspended.",
                execution.instance
            )));
        }
        Ok(execution)
    }

    /// Create the wait states of the execution's current stage, or end the
    /// instance when there are no stages left.
    fn enter_stage(&mut self, id: &ProcessInstanceId, config: &EngineConfig) {
        let Some(execution) = self.instances.get_mut(id) else {
            return;
        };
        let Some(stage) = execution.model.stages().get(execution.stage) else {
            let end_event = execution.model.end_event_id().to_string();
            self.instances.remove(id);
            self.pass(id, &end_event, config.history_enabled());
            tracing::debug!(process_instance = %id, "process instance ended");
            return;
        };
        execution.pending = stage
            .iter()
            .map(|wait| match &wait.kind {
                WaitKind::Message { message_name } => Pending::Message(EventSubscription {
                    id: SubscriptionId::generate(),
                    event_type: EventType::Message,
                    event_name: message_name.clone(),
                    process_instance_id: id.clone(),
                    activity_id: wait.activity_id.clone(),
                }),
                WaitKind::UserTask { name, assignee } => Pending::Task(Task {
                    id: TaskId::generate(),
                    process_instance_id: id.clone(),
                    task_definition_key: wait.activity_id.clone(),
                    name: Some(name.clone()),
                    assignee: assignee.clone(),
                }),
                WaitKind::Job => Pending::Job(Job {
                    id: JobId::generate(),
                    process_instance_id: id.clone(),
                    activity_id: wait.activity_id.clone(),
                    retries: config.default_job_retries(),
                    exception_message: None,
                }),
            })
            .collect();
    }

    /// Resolve one wait state and advance the stage once all are resolved.
    fn resolve(&mut self, id: &ProcessInstanceId, activity_id: &str, config: &EngineConfig) {
        let Some(execution) = self.instances.get_mut(id) else {
            return;
        };
        execution.pending.retain(|p| p.activity_id() != activity_id);
        let stage_done = execution.pending.is_empty();
        if stage_done {
            execution.stage += 1;
        }
        self.pass(id, activity_id, config.history_enabled());
        if stage_done {
            self.enter_stage(id, config);
        }
    }
}

fn not_found(kind: &'static str, id: &impl fmt::Display) -> Error {
    Error::NotFound {
        kind,
        id: id.to_string(),
    }
}

impl ProcessEngine for InMemoryEngine {
    fn name(&self) -> &str {
        self.config.name()
    }

    async fn process_instances(&self, query: &ProcessInstanceQuery) -> Result<Vec<ProcessInstance>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .values()
            .map(|e| &e.instance)
            .filter(|i| query.matches(i))
            .cloned()
            .collect())
    }

    async fn event_subscriptions(
        &self,
        query: &EventSubscriptionQuery,
    ) -> Result<Vec<EventSubscription>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .values()
            .flat_map(|e| e.pending.iter())
            .filter_map(|p| match p {
                Pending::Message(s) if query.matches(s) => Some(s.clone()),
                _ => None,
            })
            .collect())
    }

    async fn active_activity_ids(&self, id: &ProcessInstanceId) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .get(id)
            .map(|e| e.pending.iter().map(|p| p.activity_id().to_string()).collect())
            .unwrap_or_default())
    }

    async fn passed_activity_ids(&self, id: &ProcessInstanceId) -> Result<Option<Vec<String>>> {
        if !self.config.history_enabled() {
            return Ok(None);
        }
        let state = self.state.read().await;
        Ok(Some(state.history.get(id).cloned().unwrap_or_default()))
    }

    async fn variables(&self, id: &ProcessInstanceId) -> Result<BTreeMap<String, serde_json::Value>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .get(id)
            .map(|e| e.variables.clone())
            .unwrap_or_default())
    }

    async fn tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .values()
            .flat_map(|e| e.pending.iter())
            .filter_map(|p| match p {
                Pending::Task(t) if query.matches(t) => Some(t.clone()),
                _ => None,
            })
            .collect())
    }

    async fn jobs(&self, query: &JobQuery) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .values()
            .flat_map(|e| e.pending.iter())
            .filter_map(|p| match p {
                Pending::Job(j) if query.matches(j) => Some(j.clone()),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_messages() -> ProcessModel {
        ProcessModel::new("two-messages").stage([
            WaitState::message("ReceiveMine", "myMessage"),
            WaitState::message("ReceiveYours", "yourMessage"),
        ])
    }

    #[tokio::test]
    async fn redeploy_increments_version() {
        let engine = InMemoryEngine::default();
        let v1 = engine.deploy(two_messages()).await.unwrap();
        let v2 = engine.deploy(two_messages()).await.unwrap();
        assert_eq!((v1.version, v2.version), (1, 2));
        assert!(v2.id.as_str().starts_with("two-messages:2:"));

        let instance = engine.start_process_instance_by_key("two-messages").await.unwrap();
        assert_eq!(instance.process_definition_id, v2.id);
    }

    #[tokio::test]
    async fn unknown_key_cannot_start() {
        let engine = InMemoryEngine::default();
        assert_eq!(
            engine.start_process_instance_by_key("nope").await.unwrap_err(),
            Error::UnknownProcessDefinition("nope".into())
        );
    }

    #[tokio::test]
    async fn parallel_messages_end_instance_after_both_correlated() {
        let engine = InMemoryEngine::default();
        engine.deploy(two_messages()).await.unwrap();
        let instance = engine.start_process_instance_by_key("two-messages").await.unwrap();

        engine.correlate_message("myMessage").await.unwrap();
        assert!(engine.process_instance(&instance.id).await.unwrap().is_some());
        assert_eq!(
            engine.active_activity_ids(&instance.id).await.unwrap(),
            vec!["ReceiveYours".to_string()]
        );

        engine.correlate_message("yourMessage").await.unwrap();
        assert!(engine.process_instance(&instance.id).await.unwrap().is_none());
        assert_eq!(
            engine.passed_activity_ids(&instance.id).await.unwrap().unwrap(),
            ["StartEvent", "ReceiveMine", "ReceiveYours", "EndEvent"]
        );
    }

    #[tokio::test]
    async fn correlation_requires_exactly_one_subscription() {
        let engine = InMemoryEngine::default();
        engine.deploy(two_messages()).await.unwrap();

        assert_eq!(
            engine.correlate_message("myMessage").await.unwrap_err(),
            Error::MismatchingCorrelation {
                message: "myMessage".into(),
                matches: 0
            }
        );

        engine.start_process_instance_by_key("two-messages").await.unwrap();
        engine.start_process_instance_by_key("two-messages").await.unwrap();
        assert_eq!(
            engine.correlate_message("myMessage").await.unwrap_err(),
            Error::MismatchingCorrelation {
                message: "myMessage".into(),
                matches: 2
            }
        );
    }

    #[tokio::test]
    async fn suspended_instances_are_not_correlated() {
        let engine = InMemoryEngine::default();
        engine.deploy(two_messages()).await.unwrap();
        let instance = engine.start_process_instance_by_key("two-messages").await.unwrap();
        engine.suspend(&instance.id).await.unwrap();

        assert!(engine.correlate_message("myMessage").await.is_err());

        engine.activate(&instance.id).await.unwrap();
        assert_eq!(engine.correlate_message("myMessage").await.unwrap(), instance.id);
    }

    #[tokio::test]
    async fn failed_job_keeps_instance_waiting() {
        let engine = InMemoryEngine::new(EngineConfig::default().with_default_job_retries(1));
        engine
            .deploy(ProcessModel::new("job").then(WaitState::job("Charge")))
            .await
            .unwrap();
        let instance = engine.start_process_instance_by_key("job").await.unwrap();
        let job = engine.jobs(&JobQuery::new()).await.unwrap().remove(0);

        engine.fail_job(&job.id, "card declined").await.unwrap();
        let job = engine.jobs(&JobQuery::new().with_job_id(&job.id)).await.unwrap().remove(0);
        assert_eq!(job.retries, 0);
        assert_eq!(job.exception_message.as_deref(), Some("card declined"));

        assert!(engine.execute_job(&job.id).await.is_err());
        assert!(engine.fail_job(&job.id, "again").await.is_err());
        assert!(engine.process_instance(&instance.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn model_without_stages_ends_immediately() {
        let engine = InMemoryEngine::default();
        engine.deploy(ProcessModel::new("noop")).await.unwrap();
        let instance = engine.start_process_instance_by_key("noop").await.unwrap();
        assert!(engine.process_instance(&instance.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_disabled_reports_none() {
        let engine = InMemoryEngine::new(EngineConfig::default().with_history(false));
        engine.deploy(ProcessModel::new("noop")).await.unwrap();
        let instance = engine.start_process_instance_by_key("noop").await.unwrap();
        assert_eq!(engine.passed_activity_ids(&instance.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn commands_on_unknown_ids_are_not_found() {
        let engine = InMemoryEngine::default();
        assert_eq!(
            engine.complete_task(&TaskId::new("t-404")).await.unwrap_err(),
            Error::NotFound {
                kind: "Task",
                id: "t-404".into()
            }
        );
        assert!(matches!(
            engine.suspend(&ProcessInstanceId::new("pi-404")).await,
            Err(Error::NotFound { .. })
        ));
    }
}
