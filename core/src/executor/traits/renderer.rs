use crate::executor::types::TaskRecord;

/// Output renderer plugin (controls progress output format).
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
    },
    Plan {
        run_id: String,
        order: Vec<String>,
        critical_path: Vec<String>,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        depth: u32,
    },
    TaskComplete {
        run_id: String,
        record: TaskRecord,
    },
    RecoveryStart {
        run_id: String,
        failed_task: String,
        graph: String,
        task_ids: Vec<String>,
        depth: u32,
    },
    RunEnd {
        run_id: String,
        success: bool,
        failed_task: Option<String>,
        duration_ms: u64,
    },
}
