//! Progress indicators for voicestack.

use colored::Colorize;
use declarative::{ApplyError, NodeKind, NodeState, Outputs, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Shows one spinner per node while its creation contract runs
pub struct DeployProgress {
    quiet: bool,
    total: usize,
    done: usize,
    current: Option<ProgressBar>,
}

impl DeployProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            total: 0,
            done: 0,
            current: None,
        }
    }

    fn finish_current(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for DeployProgress {
    fn on_plan(&mut self, order: &[String]) {
        self.total = order.len();
        if self.quiet {
            return;
        }
        ui::section("Apply order");
        for (i, id) in order.iter().enumerate() {
            println!("  {}. {}", i + 1, id);
        }
    }

    fn on_node_start(&mut self, id: &str, kind: NodeKind, description: &str) {
        if self.quiet {
            return;
        }
        self.finish_current();
        let msg = format!(
            "[{}/{}] {} {} {}",
            self.done + 1,
            self.total,
            ui::kind_label(kind),
            id.bold(),
            description.dimmed()
        );
        self.current = Some(spinner(&msg));
    }

    fn on_node_applied(&mut self, id: &str, outputs: &Outputs) {
        self.done += 1;
        if self.quiet {
            return;
        }
        self.finish_current();
        ui::state_line(NodeState::Applied, id);
        for (field, value) in outputs.iter() {
            ui::kv(field, value);
        }
    }

    fn on_node_failed(&mut self, id: &str, error: &ApplyError) {
        self.finish_current();
        ui::state_line(NodeState::Failed, &format!("{id}: {error}"));
    }
}

impl Drop for DeployProgress {
    fn drop(&mut self) {
        self.finish_current();
    }
}
