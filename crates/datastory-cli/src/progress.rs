use datastory_core::models::{StepStatus, TranscriptionStep};
use datastory_jobs::PollingState;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} checks ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    pb.set_message(message.to_string());
    pb
}

/// Create a multi-progress container, drawing nothing when hidden
pub fn create_multi_progress(visible: bool) -> MultiProgress {
    if visible {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}

/// One spinner per submission step, shown once the step starts
pub struct SubmissionProgress {
    multi: MultiProgress,
    bars: Vec<(String, ProgressBar)>,
}

impl SubmissionProgress {
    pub fn new(visible: bool) -> Self {
        Self {
            multi: create_multi_progress(visible),
            bars: Vec::new(),
        }
    }

    fn bar(&mut self, step: &TranscriptionStep) -> &ProgressBar {
        let index = match self.bars.iter().position(|(id, _)| *id == step.id) {
            Some(index) => index,
            None => {
                let bar = self.multi.add(create_spinner(&step.message));
                self.bars.push((step.id.clone(), bar));
                self.bars.len() - 1
            }
        };
        &self.bars[index].1
    }

    /// Bring the spinners in line with a step snapshot
    pub fn render(&mut self, steps: &[TranscriptionStep]) {
        for step in steps.iter().filter(|s| s.status != StepStatus::Pending) {
            let bar = self.bar(step);
            if bar.is_finished() {
                continue;
            }
            match step.status {
                StepStatus::Active => bar.set_message(step.message.clone()),
                StepStatus::Completed => finish_success(bar, &step.message),
                StepStatus::Error => finish_error(bar, &step.message),
                StepStatus::Pending => {}
            }
        }
    }

    /// Stop any spinner still running
    pub fn finish(&self) {
        for (_, bar) in self.bars.iter().filter(|(_, bar)| !bar.is_finished()) {
            bar.abandon();
        }
    }
}

/// Attempt counter and execution summary while polling
pub struct PollProgress {
    bar: ProgressBar,
}

impl PollProgress {
    pub fn new(max_attempts: u32, visible: bool) -> Self {
        let bar = create_progress_bar(u64::from(max_attempts), "Waiting for executions...");
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar }
    }

    pub fn update(&self, state: &PollingState) {
        self.bar.set_position(u64::from(state.attempts));
        self.bar.set_message(describe(state));
    }

    pub fn finish(&self, state: &PollingState) {
        self.update(state);
        if state.is_timed_out() {
            finish_error(&self.bar, "Timed out waiting for executions");
        } else if state.has_failed_execution() {
            finish_error(&self.bar, "An execution failed");
        } else if state.has_successful_execution() {
            // Keep the bar at the attempts actually made
            self.bar.abandon_with_message("✓ Analysis finished");
        } else {
            self.bar.abandon();
        }
    }

    #[cfg(test)]
    fn message(&self) -> String {
        self.bar.message()
    }
}

/// One-line summary of a polling snapshot
pub fn describe(state: &PollingState) -> String {
    let summary = state.summary();
    if summary.total == 0 {
        return "No executions yet".to_string();
    }
    format!(
        "{} executions: {} running, {} completed, {} failed ({:.0}%)",
        summary.total,
        summary.running,
        summary.completed,
        summary.failed,
        summary.progress * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastory_core::models::Execution;

    fn step(id: &str, status: StepStatus, message: &str) -> TranscriptionStep {
        let mut step = TranscriptionStep::pending(id, id, message);
        step.status = status;
        step
    }

    fn execution(status: &str, progress: f64) -> Execution {
        Execution {
            id: "e1".to_string(),
            modelid: "m".to_string(),
            bindings: None,
            runid: None,
            status: Some(status.to_string()),
            run_progress: Some(progress),
            results: None,
            selected: None,
        }
    }

    #[test]
    fn test_pending_steps_get_no_spinner() {
        let mut progress = SubmissionProgress::new(false);
        progress.render(&[
            step("step1", StepStatus::Completed, "done"),
            step("step2", StepStatus::Active, "working"),
            step("step3", StepStatus::Pending, "waiting"),
        ]);

        assert_eq!(progress.bars.len(), 2);
        assert!(progress.bars[0].1.is_finished());
        assert!(!progress.bars[1].1.is_finished());

        progress.render(&[
            step("step1", StepStatus::Completed, "done"),
            step("step2", StepStatus::Error, "Error: boom"),
            step("step3", StepStatus::Pending, "waiting"),
        ]);
        assert_eq!(progress.bars.len(), 2);
        assert_eq!(progress.bars[1].1.message(), "✗ Error: boom");
    }

    #[test]
    fn test_describe_summarizes_executions() {
        let state = PollingState {
            executions: vec![execution("RUNNING", 0.5), execution("SUCCESS", 1.0)],
            attempts: 2,
            ..Default::default()
        };

        assert_eq!(
            describe(&state),
            "2 executions: 1 running, 1 completed, 0 failed (75%)"
        );
        assert_eq!(describe(&PollingState::default()), "No executions yet");
    }

    #[test]
    fn test_poll_progress_tracks_attempts() {
        let progress = PollProgress::new(10, false);
        let state = PollingState {
            executions: vec![execution("SUCCESS", 1.0)],
            attempts: 3,
            is_complete: true,
            ..Default::default()
        };

        progress.finish(&state);
        assert_eq!(progress.bar.position(), 3);
        assert_eq!(progress.message(), "✓ Analysis finished");
    }
}
