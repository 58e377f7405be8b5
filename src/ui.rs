//! Terminal output for deploy, plan and outputs

use colored::Colorize;
use declarative::{ErrorCategory, NodeKind, NodeState};

/// Title block naming the stack a command acts on
pub fn stack_header(action: &str, stack: &str) {
    let title = format!("{action} {stack}");
    println!();
    println!("{} {}", action.dimmed(), stack.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// A remark about the run as a whole rather than one node
pub fn note(msg: &str) {
    println!("{} {}", "→".blue(), msg);
}

/// A line led by a node state's symbol; failures go to stderr
pub fn state_line(state: NodeState, msg: &str) {
    match state {
        NodeState::Failed => eprintln!("{} {}", state_symbol(state), msg),
        _ => println!("{} {}", state_symbol(state), msg),
    }
}

/// One wave of the apply order
pub fn wave(num: usize, total: usize, ids: &[String]) {
    println!(
        "{} {}",
        format!("[{num}/{total}]").blue().bold(),
        ids.join(", ")
    );
}

/// Short colored label for a node kind
pub fn kind_label(kind: NodeKind) -> String {
    let label = format!("{:<8}", kind.as_str());
    match kind {
        NodeKind::Image => label.magenta().to_string(),
        NodeKind::Identity => label.yellow().to_string(),
        NodeKind::PermissionStatement => label.dimmed().to_string(),
        NodeKind::Runtime => label.cyan().to_string(),
    }
}

/// Symbol for a node's lifecycle state
pub fn state_symbol(state: NodeState) -> String {
    match state {
        NodeState::Pending => "○".dimmed().to_string(),
        NodeState::Resolving => "◐".blue().to_string(),
        NodeState::Applied => "✓".green().to_string(),
        NodeState::Failed => "✗".red().to_string(),
    }
}

/// Print an error category's explanation and advice
pub fn category_hint(category: ErrorCategory) {
    eprintln!("  {} {}", "→".dimmed(), category.description().dimmed());
    eprintln!("  {} {}", "→".dimmed(), category.advice());
}
