use enscribe::{ExecutionResult, RunReporter, Step, StepStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use yansi::Paint;

/// Terminal progress of a run: one spinner per step, in step order.
#[derive(Debug)]
pub struct StepProgress {
    multi: MultiProgress,
    total: usize,
    spinners: Mutex<HashMap<usize, ProgressBar>>,
}

impl StepProgress {
    pub fn new(total: usize) -> Self {
        Self { multi: MultiProgress::new(), total, spinners: Default::default() }
    }

    fn spinner(&self, index: usize, step: &Step) -> ProgressBar {
        self.spinners
            .lock()
            .entry(index)
            .or_insert_with(|| {
                let style = ProgressStyle::with_template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
                let spinner = self.multi.add(ProgressBar::new_spinner().with_style(style));
                spinner.set_message(self.label(index, step));
                spinner
            })
            .clone()
    }

    fn label(&self, index: usize, step: &Step) -> String {
        format!("[{}/{}] {}", index + 1, self.total, step.title)
    }
}

impl RunReporter for StepProgress {
    fn on_step_started(&self, index: usize, step: &Step) {
        let spinner = self.spinner(index, step);
        spinner.set_message(format!("{} {}", self.label(index, step), "[Pending]".yellow()));
        spinner.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_step_status(&self, index: usize, step: &Step, status: StepStatus) {
        let spinner = self.spinner(index, step);
        let label = self.label(index, step);
        match status {
            StepStatus::Completed => spinner.finish_with_message(format!("{} {label}", "✓".green())),
            StepStatus::Error => spinner.abandon_with_message(format!("{} {label}", "✗".red())),
            StepStatus::Pending => {
                spinner.abandon_with_message(format!("{} {label} {}", "!".yellow(), "[Rejected]".yellow()));
                // A retry gets a fresh spinner.
                self.spinners.lock().remove(&index);
            }
        }
    }

    fn on_outcome(&self, result: &ExecutionResult) {
        debug!(target: "naming::progress", %result, "run finished");
    }
}
