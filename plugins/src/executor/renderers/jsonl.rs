use chrono::Local;
use serde_json::{json, Value};
use taskforge_core::api::{OutputRendererPlugin, RenderEvent, TaskStatus};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                }
            }),
            RenderEvent::Plan {
                run_id,
                order,
                critical_path,
            } => json!({
                "v": 1,
                "event_type": "executor.plan",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "order": order,
                    "critical_path": critical_path,
                    "total_tasks": order.len(),
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                depth,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "depth": depth,
                }
            }),
            RenderEvent::TaskComplete { run_id, record } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": record.task_id,
                "status": record.status.as_str(),
                "metadata": {
                    "graph": record.graph,
                    "depth": record.depth,
                    "kind": record.kind.as_str(),
                    "duration_ms": record.duration_ms,
                    "success": record.status == TaskStatus::Completed,
                    "error": record.error,
                }
            }),
            RenderEvent::RecoveryStart {
                run_id,
                failed_task,
                graph,
                task_ids,
                depth,
            } => json!({
                "v": 1,
                "event_type": "recovery.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": failed_task,
                "metadata": {
                    "graph": graph,
                    "tasks": task_ids,
                    "depth": depth,
                }
            }),
            RenderEvent::RunEnd {
                run_id,
                success,
                failed_task,
                duration_ms,
            } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "success": success,
                    "failed_task": failed_task,
                    "duration_ms": duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::{TaskKind, TaskRecord};

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            total_tasks: 2,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["metadata"]["total_tasks"], 2);
    }

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            record: TaskRecord {
                task_id: "plan-1-fix-1".to_string(),
                graph: "plan-1-fix".to_string(),
                depth: 1,
                kind: TaskKind::Modify,
                description: "patch".to_string(),
                status: TaskStatus::Completed,
                output: "ok".to_string(),
                error: None,
                duration_ms: 12,
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["metadata"]["depth"], 1);
        assert_eq!(value["metadata"]["success"], true);
    }

    #[test]
    fn test_jsonl_renderer_recovery_start() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RecoveryStart {
            run_id: "run".to_string(),
            failed_task: "plan-2".to_string(),
            graph: "plan-2-fix".to_string(),
            task_ids: vec!["plan-2-fix-1".to_string()],
            depth: 1,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "recovery.start");
        assert_eq!(value["task_id"], "plan-2");
        assert_eq!(value["metadata"]["tasks"][0], "plan-2-fix-1");
    }
}
