use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskforge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Id namespace of top-level plans (`plan-1`, `plan-2`, ...).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Project name used by scaffold templates when the request names none.
    #[serde(default = "default_project_name")]
    pub default_project_name: String,

    #[serde(default = "default_templates_enabled")]
    pub templates_enabled: bool,

    #[serde(default = "default_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,
}

fn default_namespace() -> String {
    "plan".to_string()
}

fn default_project_name() -> String {
    "app".to_string()
}

fn default_templates_enabled() -> bool {
    true
}

fn default_synthesis_timeout_secs() -> u64 {
    120
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            default_project_name: default_project_name(),
            templates_enabled: default_templates_enabled(),
            synthesis_timeout_secs: default_synthesis_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    /// No remote capability; open-ended requests fail to plan.
    #[default]
    None,
    /// HTTP text-generation service.
    AiService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub provider: SynthesisProvider,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::None,
            url: String::new(),
            model: None,
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SynthesisConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider == SynthesisProvider::AiService && !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Directory commands run in and content paths resolve against.
    #[serde(default = "default_workspace")]
    pub workspace: String,

    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,

    #[serde(default = "default_validation_timeout_secs")]
    pub validation_timeout_secs: u64,

    #[serde(default = "default_max_recovery_depth")]
    pub max_recovery_depth: u32,

    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_workspace() -> String {
    ".".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_action_timeout_secs() -> u64 {
    300
}

fn default_validation_timeout_secs() -> u64 {
    120
}

fn default_max_recovery_depth() -> u32 {
    3
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

fn default_progress_bar() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            shell: default_shell(),
            action_timeout_secs: default_action_timeout_secs(),
            validation_timeout_secs: default_validation_timeout_secs(),
            max_recovery_depth: default_max_recovery_depth(),
            capture_bytes: default_capture_bytes(),
            progress_bar: default_progress_bar(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Plain ASCII markers in text output.
    #[serde(default)]
    pub ascii_only: bool,
}
