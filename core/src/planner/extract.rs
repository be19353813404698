//! Tolerant parsing of free-form synthesis output.
//!
//! Model replies tend to wrap the task list in prose or code fences, and
//! individual entries are sometimes incomplete. Parsing here is pure: find the
//! first balanced JSON span with a task-list shape, then keep every entry that
//! has a usable description and drop the rest.

use serde_json::{Map, Value};

use crate::error::PlannerError;

use super::types::SynthesizedTask;

/// First balanced `[...]` or `{...}` span of `text` that parses as JSON.
pub fn extract_json_span(text: &str) -> Option<&str> {
    next_json_span(text, 0).map(|(_, span)| span)
}

/// Parse synthesis output into task entries.
///
/// Accepts a top-level array, an object holding a `tasks`/`steps` array, or a
/// single task object. An explicit empty list yields `Ok(vec![])`; the caller
/// decides whether that is fatal.
pub fn parse_synthesized_tasks(text: &str) -> Result<Vec<SynthesizedTask>, PlannerError> {
    let mut from = 0;
    let mut saw_json = false;

    while let Some((start, span)) = next_json_span(text, from) {
        saw_json = true;
        from = start + 1;

        let Ok(value) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        let Some(entries) = task_entries(&value) else {
            continue;
        };

        let total = entries.len();
        let tasks: Vec<SynthesizedTask> = entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let task = task_from_value(entry);
                if task.is_none() {
                    tracing::warn!(index = idx, "dropping malformed synthesized task entry");
                }
                task
            })
            .collect();

        if total > 0 && tasks.is_empty() {
            return Err(PlannerError::PlanningFailed(format!(
                "all {total} synthesized task entries were malformed"
            )));
        }
        return Ok(tasks);
    }

    let reason = if saw_json {
        "synthesis output contained no task list"
    } else {
        "synthesis output contained no JSON"
    };
    Err(PlannerError::PlanningFailed(reason.to_string()))
}

fn next_json_span(text: &str, from: usize) -> Option<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut start = from;

    while start < text.len() {
        let offset = text[start..].find(['[', '{'])?;
        let open = start + offset;
        if let Some(close) = balanced_end(bytes, open) {
            let span = &text[open..=close];
            if serde_json::from_str::<Value>(span).is_ok() {
                return Some((open, span));
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the bracket closing the one at `open`, honouring JSON strings.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' | b'{' => stack.push(b),
            b']' | b'}' => {
                let expected = if b == b']' { b'[' } else { b'{' };
                if stack.pop() != Some(expected) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn task_entries(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => {
            if items.is_empty() || items.iter().any(Value::is_object) {
                Some(items.clone())
            } else {
                None
            }
        }
        Value::Object(obj) => {
            for key in ["tasks", "steps", "plan"] {
                if let Some(Value::Array(items)) = obj.get(key) {
                    return Some(items.clone());
                }
            }
            if obj.contains_key("description") {
                Some(vec![value.clone()])
            } else {
                None
            }
        }
        _ => None,
    }
}

fn task_from_value(value: &Value) -> Option<SynthesizedTask> {
    let obj = value.as_object()?;
    let description = string_field(obj, &["description", "title", "task"])?;

    Some(SynthesizedTask {
        id: string_field(obj, &["id", "task_id", "taskId"]),
        description,
        kind: string_field(obj, &["type", "kind", "agent", "assignedAgent"]),
        dependencies: list_field(obj, &["dependencies", "depends_on", "dependsOn", "deps"]),
        file_path: string_field(obj, &["filePath", "file_path", "file", "path"]),
        command: string_field(obj, &["command", "cmd"]),
        validation_command: string_field(
            obj,
            &["validationCommand", "validation_command", "validation", "verify"],
        ),
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(scalar_to_string)
}

fn list_field(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(value) = keys.iter().find_map(|k| obj.get(*k)) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_skips_prose_and_fences() {
        let text = "Sure! Here is the plan:\n```json\n[{\"id\": \"1\", \"description\": \"a\"}]\n```\nGood luck.";
        assert_eq!(
            extract_json_span(text),
            Some("[{\"id\": \"1\", \"description\": \"a\"}]")
        );
    }

    #[test]
    fn span_ignores_brackets_inside_strings() {
        let text = r#"{"description": "use a[0] and }", "id": 1} trailing"#;
        assert_eq!(
            extract_json_span(text),
            Some(r#"{"description": "use a[0] and }", "id": 1}"#)
        );
    }

    #[test]
    fn span_moves_past_unbalanced_prefix() {
        let text = "notes [draft\n[{\"description\": \"x\"}]";
        assert_eq!(extract_json_span(text), Some("[{\"description\": \"x\"}]"));
    }

    #[test]
    fn no_json_is_planning_failure() {
        let err = parse_synthesized_tasks("I could not plan that.").unwrap_err();
        assert_eq!(
            err,
            PlannerError::PlanningFailed("synthesis output contained no JSON".to_string())
        );
    }

    #[test]
    fn explicit_empty_list_parses_to_nothing() {
        assert_eq!(parse_synthesized_tasks("[]").unwrap(), vec![]);
    }

    #[test]
    fn non_task_arrays_are_skipped() {
        let text = "Step [1] of 2: [{\"description\": \"compile\", \"type\": \"shell\", \"command\": \"make\"}]";
        let tasks = parse_synthesized_tasks(text).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].command.as_deref(), Some("make"));
        assert_eq!(tasks[0].kind.as_deref(), Some("shell"));
    }

    #[test]
    fn object_wrapper_and_field_spellings_are_accepted() {
        let text = r#"{"tasks": [
            {"id": 1, "description": "write module", "type": "code-change", "filePath": "src/a.rs"},
            {"id": 2, "title": "test it", "kind": "command", "cmd": "cargo test",
             "depends_on": [1], "validation_command": "test -f target"}
        ]}"#;
        let tasks = parse_synthesized_tasks(text).unwrap();
        assert_eq!(
            tasks,
            vec![
                SynthesizedTask {
                    id: Some("1".into()),
                    description: "write module".into(),
                    kind: Some("code-change".into()),
                    dependencies: vec![],
                    file_path: Some("src/a.rs".into()),
                    command: None,
                    validation_command: None,
                },
                SynthesizedTask {
                    id: Some("2".into()),
                    description: "test it".into(),
                    kind: Some("command".into()),
                    dependencies: vec!["1".into()],
                    file_path: None,
                    command: Some("cargo test".into()),
                    validation_command: Some("test -f target".into()),
                },
            ]
        );
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let text = r#"[
            {"id": "a", "description": "keep me"},
            {"id": "b", "description": "   "},
            "just a string",
            {"id": "c"}
        ]"#;
        let tasks = parse_synthesized_tasks(text).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn all_malformed_is_planning_failure() {
        let err = parse_synthesized_tasks(r#"[{"id": "x"}, {"id": "y"}]"#).unwrap_err();
        assert!(matches!(err, PlannerError::PlanningFailed(_)));
    }

    #[test]
    fn single_task_object_is_a_one_entry_plan() {
        let tasks = parse_synthesized_tasks(r#"{"description": "run tests", "command": "make test"}"#)
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].id.is_none());
    }
}
