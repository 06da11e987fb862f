// file: src/pipeline/progress.rs
// description: stage observation and spinner reporting for pipeline runs
// reference: uses indicatif for progress spinners

use crate::pipeline::outcome::PipelineStage;
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

/// Notified each time a run enters a new state.
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, stage: PipelineStage);
}

/// Terminal spinner showing the current stage of a run.
pub struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    pub fn new(colored: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(create_spinner_style(colored));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl StageObserver for StageSpinner {
    fn on_stage(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Done => self.bar.finish_and_clear(),
            PipelineStage::Idle => {
                self.bar.reset_elapsed();
                self.bar.set_message(stage.label());
            }
            _ => self.bar.set_message(stage.label()),
        }
    }
}

impl Drop for StageSpinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn create_spinner_style(colored: bool) -> ProgressStyle {
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] {msg:.cyan}"
    } else {
        "{spinner} [{elapsed_precise}] {msg}"
    };

    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Keeps every stage entered, in order.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct StageLog {
    stages: Mutex<Vec<PipelineStage>>,
}

#[cfg(test)]
impl StageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<PipelineStage> {
        self.stages
            .lock()
            .map(|stages| stages.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl StageObserver for StageLog {
    fn on_stage(&self, stage: PipelineStage) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(stage);
        }
    }
}
