use std::path::{Path, PathBuf};

use super::types::{AppConfig, SynthesisProvider};

/// Get the default taskforge data directory: ~/.taskforge
pub fn get_taskforge_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".taskforge"))
}

/// Load configuration from an explicit file, then apply env overrides.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    default_log_directory(&mut cfg, get_taskforge_data_dir().ok().as_deref());
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskforge/config.toml
    let user_config = get_taskforge_data_dir().ok().map(|d| d.join("config.toml"));

    // Priority 2: ./taskforge.toml (current directory)
    let local_config = Path::new("taskforge.toml");

    let mut cfg: AppConfig = match user_config.as_deref().filter(|p| p.exists()) {
        Some(path) => {
            let s = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        }
        None if local_config.exists() => {
            let s = std::fs::read_to_string(local_config)?;
            toml::from_str::<AppConfig>(&s)?
        }
        None => AppConfig::default(),
    };

    default_log_directory(&mut cfg, get_taskforge_data_dir().ok().as_deref());

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    Ok(cfg)
}

/// Log files default to `<data_dir>/logs` when no directory is configured.
fn default_log_directory(cfg: &mut AppConfig, data_dir: Option<&Path>) {
    let unset = cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if let (true, Some(dir)) = (unset, data_dir) {
        cfg.logging.directory = Some(dir.join("logs").to_string_lossy().to_string());
    }
}

/// Apply `TASKFORGE_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TASKFORGE_SYNTHESIS_URL") {
        cfg.synthesis.url = v;
        if cfg.synthesis.provider == SynthesisProvider::None {
            cfg.synthesis.provider = SynthesisProvider::AiService;
        }
    }
    if let Some(v) = get("TASKFORGE_SYNTHESIS_MODEL") {
        cfg.synthesis.model = Some(v);
    }
    if let Some(v) = get("TASKFORGE_SYNTHESIS_API_KEY") {
        cfg.synthesis.api_key = v;
    }
    if let Some(v) = get("TASKFORGE_MAX_RECOVERY_DEPTH") {
        match v.trim().parse::<u32>() {
            Ok(depth) => cfg.executor.max_recovery_depth = depth,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid TASKFORGE_MAX_RECOVERY_DEPTH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[executor]
max_recovery_depth = 1
shell = "bash"

[output]
format = "jsonl"
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.executor.max_recovery_depth, 1);
        assert_eq!(cfg.executor.shell, "bash");
        assert_eq!(cfg.executor.action_timeout_secs, 300);
        assert_eq!(cfg.output.format, OutputFormat::Jsonl);
        assert_eq!(cfg.planner.namespace, "plan");
        assert!(cfg.planner.templates_enabled);
    }

    #[test]
    fn explicit_file_gets_default_log_directory() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor]\nshell = \"sh\"").unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        let expected = get_taskforge_data_dir()
            .ok()
            .map(|d| d.join("logs").to_string_lossy().to_string());
        assert_eq!(cfg.logging.directory, expected);
    }

    #[test]
    fn configured_log_directory_is_kept() {
        let mut cfg = AppConfig::default();
        cfg.logging.directory = Some("/var/log/taskforge".into());
        default_log_directory(&mut cfg, Some(Path::new("/home/u/.taskforge")));
        assert_eq!(cfg.logging.directory.as_deref(), Some("/var/log/taskforge"));

        cfg.logging.directory = Some("  ".into());
        default_log_directory(&mut cfg, Some(Path::new("/home/u/.taskforge")));
        assert_eq!(
            cfg.logging.directory.as_deref(),
            Some("/home/u/.taskforge/logs")
        );
    }

    #[test]
    fn invalid_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor\nbroken").unwrap();
        let err = load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn env_overrides_enable_synthesis() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TASKFORGE_SYNTHESIS_URL", "http://localhost:9000/generate"),
            ("TASKFORGE_SYNTHESIS_MODEL", "planner-small"),
            ("TASKFORGE_MAX_RECOVERY_DEPTH", "5"),
            ("TASKFORGE_SYNTHESIS_API_KEY", "  "),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.synthesis.provider, SynthesisProvider::AiService);
        assert!(cfg.synthesis.is_enabled());
        assert_eq!(cfg.synthesis.model.as_deref(), Some("planner-small"));
        assert_eq!(cfg.synthesis.api_key, "");
        assert_eq!(cfg.executor.max_recovery_depth, 5);
    }

    #[test]
    fn bad_depth_override_is_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| {
            (k == "TASKFORGE_MAX_RECOVERY_DEPTH").then(|| "many".to_string())
        });
        assert_eq!(cfg.executor.max_recovery_depth, 3);
    }
}
