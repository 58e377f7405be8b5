//! Apply context and callback traits
//!
//! These traits keep the orchestrator free of any particular UI: the
//! binary plugs in spinners and prompts, tests plug in recorders.

use crate::error::ApplyError;
use crate::types::{NodeKind, Outputs, ResolvedProperties};

/// Progress callback for execution operations
///
/// All methods are called from the thread driving the walk, never from
/// worker threads.
pub trait ProgressCallback: Send {
    /// Called once the apply order is known
    fn on_plan(&mut self, order: &[String]);

    /// Called before a node's creation contract is invoked
    fn on_node_start(&mut self, id: &str, kind: NodeKind, description: &str);

    /// Called when a node reaches `Applied`
    fn on_node_applied(&mut self, id: &str, outputs: &Outputs);

    /// Called when a node reaches `Failed`
    fn on_node_failed(&mut self, id: &str, error: &ApplyError);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan(&mut self, _order: &[String]) {}
    fn on_node_start(&mut self, _id: &str, _kind: NodeKind, _description: &str) {}
    fn on_node_applied(&mut self, _id: &str, _outputs: &Outputs) {}
    fn on_node_failed(&mut self, _id: &str, _error: &ApplyError) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Context passed to a resource's creation contract
pub struct ApplyContext<'a> {
    /// Id of the node being applied
    pub node: &'a str,
    /// Declared properties with references substituted
    pub properties: &'a ResolvedProperties,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(node: &'a str, properties: &'a ResolvedProperties, verbose: bool) -> Self {
        Self {
            node,
            properties,
            verbose,
        }
    }
}
