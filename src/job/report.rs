use serde::Serialize;
use tracing::{error, info};

/// Job-result sink of the external job framework.
///
/// Called after every step with cumulative counters, so a crash mid-run
/// still leaves partial progress visible.
pub trait JobReporter: Send {
    fn register_success(&mut self);
    fn register_error(&mut self, message: &str);
    fn add_report(&mut self, line: &str);
    fn set_nb_items_to_process(&mut self, count: u64);
    fn set_nb_items_correct(&mut self, count: u64);
    fn set_nb_items_error(&mut self, count: u64);
    fn set_nb_items_warning(&mut self, count: u64);
}

/// In-memory job result used by the binary and by tests.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct JobExecutionResult {
    pub successes: u64,
    pub errors: Vec<String>,
    pub report: Vec<String>,
    pub nb_items_to_process: u64,
    pub nb_items_correct: u64,
    pub nb_items_error: u64,
    pub nb_items_warning: u64,
}

impl JobExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl JobReporter for JobExecutionResult {
    fn register_success(&mut self) {
        self.successes += 1;
    }

    fn register_error(&mut self, message: &str) {
        error!(message, "job error registered");
        self.errors.push(message.to_string());
    }

    fn add_report(&mut self, line: &str) {
        info!(line, "job report");
        self.report.push(line.to_string());
    }

    fn set_nb_items_to_process(&mut self, count: u64) {
        self.nb_items_to_process = count;
    }

    fn set_nb_items_correct(&mut self, count: u64) {
        self.nb_items_correct = count;
    }

    fn set_nb_items_error(&mut self, count: u64) {
        self.nb_items_error = count;
    }

    fn set_nb_items_warning(&mut self, count: u64) {
        self.nb_items_warning = count;
    }
}
