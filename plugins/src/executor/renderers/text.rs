use taskforge_core::api::{OutputRendererPlugin, RenderEvent, TaskStatus};

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn arrow(&self) -> &'static str {
        if self.ascii_only {
            " -> "
        } else {
            " → "
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
            } => format!("RUN START {} (tasks: {})", run_id, total_tasks),
            RenderEvent::Plan {
                run_id,
                order,
                critical_path,
            } => {
                let mut out = format!("PLAN {}:", run_id);
                out.push_str(&format!("\n  order: {}", order.join(self.arrow())));
                if !critical_path.is_empty() {
                    out.push_str(&format!(
                        "\n  critical path: {}",
                        critical_path.join(self.arrow())
                    ));
                }
                out
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                depth,
            } => format!("TASK START {} (task {}, depth {})", run_id, task_id, depth),
            RenderEvent::TaskComplete { run_id, record } => {
                let status = match (record.status, self.ascii_only) {
                    (TaskStatus::Completed, true) => "OK",
                    (TaskStatus::Completed, false) => "SUCCESS",
                    (_, true) => "FAIL",
                    (_, false) => "FAILED",
                };
                let mut line = format!(
                    "TASK END {} (task {}, {}, status {}, duration {}ms)",
                    run_id,
                    record.task_id,
                    record.kind.as_str(),
                    status,
                    record.duration_ms
                );
                if let Some(err) = record.error.as_deref() {
                    let first = err.lines().next().unwrap_or_default();
                    line.push_str(&format!(": {}", first));
                }
                line
            }
            RenderEvent::RecoveryStart {
                run_id,
                failed_task,
                graph,
                task_ids,
                depth,
            } => format!(
                "RECOVERY {} (task {}, graph {}, depth {}, tasks: {})",
                run_id,
                failed_task,
                graph,
                depth,
                task_ids.join(", ")
            ),
            RenderEvent::RunEnd {
                run_id,
                success,
                failed_task,
                duration_ms,
            } => {
                let status = if *success { "success" } else { "failed" };
                let mut line = format!(
                    "RUN END {} ({}, duration {}ms)",
                    run_id, status, duration_ms
                );
                if let Some(task) = failed_task {
                    line.push_str(&format!(", failed task {}", task));
                }
                line
            }
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::{TaskKind, TaskRecord};

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            record: TaskRecord {
                task_id: "plan-2".to_string(),
                graph: "plan".to_string(),
                depth: 0,
                kind: TaskKind::Command,
                description: "build".to_string(),
                status: TaskStatus::Failed,
                output: String::new(),
                error: Some("`cargo build` exited with 101\nmore".to_string()),
                duration_ms: 5,
            },
        };

        let line = renderer.format_event(&event);
        assert!(line.contains("TASK END"));
        assert!(line.contains("status FAIL"));
        assert!(line.ends_with(": `cargo build` exited with 101"));
    }

    #[test]
    fn test_text_renderer_plan_ascii() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::Plan {
            run_id: "run".to_string(),
            order: vec!["plan-1".to_string(), "plan-2".to_string()],
            critical_path: vec!["plan-1".to_string(), "plan-2".to_string()],
        };

        let text = renderer.format_event(&event);
        assert!(text.contains("order: plan-1 -> plan-2"));
        assert!(text.contains("critical path: plan-1 -> plan-2"));
    }

    #[test]
    fn test_text_renderer_run_end_names_failed_task() {
        let renderer = TextRendererPlugin::new(false);
        let event = RenderEvent::RunEnd {
            run_id: "run".to_string(),
            success: false,
            failed_task: Some("plan-3".to_string()),
            duration_ms: 40,
        };

        assert_eq!(
            renderer.format_event(&event),
            "RUN END run (failed, duration 40ms), failed task plan-3"
        );
    }
}
