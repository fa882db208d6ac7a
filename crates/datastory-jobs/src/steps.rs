use datastory_core::models::{StepStatus, TranscriptionStep};
use tokio::sync::watch;

/// Ordered step list of the current submission attempt, published to
/// subscribers on every change
#[derive(Debug)]
pub struct StepTracker {
    steps: watch::Sender<Vec<TranscriptionStep>>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self {
            steps: watch::Sender::new(Vec::new()),
        }
    }

    /// Replace the list wholesale
    pub fn initialize(&self, steps: Vec<TranscriptionStep>) {
        self.steps.send_replace(steps);
    }

    pub fn update(&self, id: &str, message: impl Into<String>, status: StepStatus) {
        let message = message.into();
        self.steps.send_modify(|steps| {
            if let Some(step) = steps.iter_mut().find(|s| s.id == id) {
                step.status = status;
                step.message = message;
            }
        });
    }

    /// Mark whichever step is active as failed; completed steps keep their status
    pub fn fail_active(&self, reason: &str) {
        self.steps.send_if_modified(|steps| {
            let mut changed = false;
            for step in steps.iter_mut().filter(|s| s.status == StepStatus::Active) {
                step.status = StepStatus::Error;
                step.message = format!("Error: {}", reason);
                changed = true;
            }
            changed
        });
    }

    pub fn clear(&self) {
        self.steps.send_replace(Vec::new());
    }

    pub fn snapshot(&self) -> Vec<TranscriptionStep> {
        self.steps.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TranscriptionStep>> {
        self.steps.subscribe()
    }
}

impl Default for StepTracker {
    fn default() -> Self {
        Self::new()
    }
}
