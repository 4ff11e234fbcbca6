use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const PROGRESS_FILE: &str = "progress.jsonl";
pub const STATUS_FILE: &str = "current_status.json";

/// One line of progress.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub run_id: String,
    pub target: String,
    pub event_type: EventType,
    pub message: String,
    pub progress_percentage: f32,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    RunStarted,
    ToolStarted { tool_name: String },
    ToolCompleted { tool_name: String },
    ToolFailed { tool_name: String, error: String },
    DataFound { data_type: String, count: usize },
    RunCompleted,
    RunFailed { error: String },
}

/// Appends run events to the output directory as they happen
#[derive(Clone)]
pub struct ProgressTracker {
    run_id: String,
    target: String,
    output_dir: PathBuf,
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressTracker {
    pub fn new(run_id: String, target: String, output_dir: PathBuf) -> Self {
        fs::create_dir_all(&output_dir).ok();

        Self {
            run_id,
            target,
            output_dir,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_event(
        &self,
        event_type: EventType,
        message: String,
        progress: f32,
        details: Option<serde_json::Value>,
    ) {
        let event = ProgressEvent {
            timestamp: Utc::now(),
            run_id: self.run_id.clone(),
            target: self.target.clone(),
            event_type,
            message,
            progress_percentage: progress,
            details,
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }

        self.save_to_file(&event);
    }

    // Event log is best effort: a failed write never aborts the run
    fn save_to_file(&self, event: &ProgressEvent) {
        let progress_file = self.output_dir.join(PROGRESS_FILE);

        if let Ok(json) = serde_json::to_string(event) {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&progress_file)
            {
                writeln!(file, "{}", json).ok();
            }
        }

        self.save_current_status();
    }

    fn save_current_status(&self) {
        let status_file = self.output_dir.join(STATUS_FILE);

        if let Ok(events) = self.events.lock() {
            if let Some(event) = events.last() {
                let status = serde_json::json!({
                    "run_id": self.run_id,
                    "target": self.target,
                    "last_update": event.timestamp,
                    "progress": event.progress_percentage,
                    "current_message": event.message,
                    "event_type": event.event_type,
                    "total_events": events.len(),
                });

                if let Ok(json) = serde_json::to_string_pretty(&status) {
                    fs::write(&status_file, json).ok();
                }
            }
        }
    }

    pub fn run_started(&self) {
        self.add_event(
            EventType::RunStarted,
            format!("Starting XSS discovery for {}", self.target),
            0.0,
            None,
        );
    }

    pub fn tool_started(&self, tool_name: &str, progress: f32) {
        self.add_event(
            EventType::ToolStarted {
                tool_name: tool_name.to_string(),
            },
            format!("{} started", tool_name),
            progress,
            None,
        );
    }

    pub fn tool_completed(&self, tool_name: &str, progress: f32) {
        self.add_event(
            EventType::ToolCompleted {
                tool_name: tool_name.to_string(),
            },
            format!("{} finished", tool_name),
            progress,
            None,
        );
    }

    pub fn tool_failed(&self, tool_name: &str, error: &str, progress: f32) {
        self.add_event(
            EventType::ToolFailed {
                tool_name: tool_name.to_string(),
                error: error.to_string(),
            },
            format!("{} failed: {}", tool_name, error),
            progress,
            None,
        );
    }

    pub fn data_found(&self, data_type: &str, count: usize, progress: f32) {
        self.add_event(
            EventType::DataFound {
                data_type: data_type.to_string(),
                count,
            },
            format!("{} {}", count, data_type),
            progress,
            Some(serde_json::json!({
                "data_type": data_type,
                "count": count,
            })),
        );
    }

    pub fn run_completed(&self) {
        self.add_event(
            EventType::RunCompleted,
            format!("Run for {} completed", self.target),
            100.0,
            None,
        );
    }

    pub fn run_failed(&self, error: &str, progress: f32) {
        self.add_event(
            EventType::RunFailed {
                error: error.to_string(),
            },
            format!("Run failed: {}", error),
            progress,
            None,
        );
    }

    /// Parse a progress.jsonl file, skipping malformed lines
    pub fn read_events_from_file(progress_file: &Path) -> Vec<ProgressEvent> {
        fs::read_to_string(progress_file)
            .map(|content| {
                content
                    .lines()
                    .filter_map(|line| serde_json::from_str::<ProgressEvent>(line).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
