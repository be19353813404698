use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Visual progress monitor for sequential task execution.
///
/// One overall bar counts attempted tasks; a spinner shows the task currently
/// running. Recovery graphs grow the overall length as they are planned.
pub struct ProgressMonitor {
    overall: ProgressBar,
    current: Option<(String, ProgressBar)>,
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_tasks` - Tasks in the requested plan
    /// * `enabled` - Whether to draw anything (off for jsonl output)
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                overall: ProgressBar::hidden(),
                current: None,
                enabled: false,
            };
        }

        let overall = ProgressBar::new(total_tasks as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            overall,
            current: None,
            enabled: true,
        }
    }

    /// Account for tasks added by a recovery graph.
    pub fn add_tasks(&self, count: usize) {
        if self.enabled {
            self.overall.inc_length(count as u64);
        }
    }

    pub fn start_task(&mut self, task_id: &str, description: &str) {
        if !self.enabled {
            return;
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(format!("{task_id}: {description}"));
        bar.enable_steady_tick(Duration::from_millis(100));
        self.current = Some((task_id.to_string(), bar));
    }

    pub fn complete_task(&mut self, task_id: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some((id, bar)) = self.current.take() {
            let mark = if success { "ok" } else { "failed" };
            bar.finish_with_message(format!("{id} {mark} ({duration_ms}ms)"));
        }
        self.overall.set_message(task_id.to_string());
        self.overall.inc(1);
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success {
            "All tasks completed"
        } else {
            "Execution failed"
        };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}
