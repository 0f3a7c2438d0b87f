/// Configuration for the in-memory process engine.
///
/// Use the builder pattern to customize, or use [`Default`] for the settings
/// a freshly created engine runs with.
///
/// # Examples
///
/// ```rust
/// use bpm_assert::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_name("billing")            // Registry key
///     .with_default_job_retries(5)     // Retries for newly created jobs
///     .with_history(false);            // Do not record passed activities
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Name under which the engine is registered.
    /// Default: "default"
    name: String,

    /// Retries a job starts with. Each failed execution decrements it;
    /// at zero the job stops being executable.
    /// Default: 3
    default_job_retries: u32,

    /// Whether completed activities are recorded.
    /// Default: true
    history_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: Self::DEFAULT_NAME.to_string(),
            default_job_retries: 3,
            history_enabled: true,
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_NAME: &'static str = "default";

    /// Set the engine name used as registry key.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the engine name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the retries newly created jobs start with.
    pub fn with_default_job_retries(mut self, retries: u32) -> Self {
        self.default_job_retries = retries;
        self
    }

    /// Returns the retries newly created jobs start with.
    pub fn default_job_retries(&self) -> u32 {
        self.default_job_retries
    }

    /// Enable or disable activity history.
    ///
    /// Without history the engine cannot tell which activities an instance
    /// has passed, so `has_passed` style assertions refuse to run.
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history_enabled = enabled;
        self
    }

    /// Returns whether activity history is recorded.
    pub fn history_enabled(&self) -> bool {
        self.history_enabled
    }
}
