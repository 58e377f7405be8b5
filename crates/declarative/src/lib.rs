//! # Declarative
//!
//! A framework for provisioning a graph of dependent resources.
//!
//! This crate provides the core abstractions for declaring resources whose
//! properties reference each other's outputs, ordering them, and applying
//! them one dependency level at a time.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something that can be created once its inputs are known
//! - **Properties**: Declared inputs; literals or references to other nodes
//! - **ResourceGraph**: Nodes, explicit edges and output bindings
//! - **ExecutionPlan**: A deterministic topological apply order
//! - **Executor**: Applies nodes in order and materializes outputs
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, ResourceGraph, execute_simple};
//!
//! let mut graph = ResourceGraph::new();
//! graph.add_resource(Box::new(image))?;
//! graph.add_resource(Box::new(role))?;
//! graph.add_resource(Box::new(runtime))?; // references image and role
//! graph.add_dependency("Role", "Runtime")?;
//! graph.add_output("RuntimeArn", "Runtime", "agentRuntimeArn")?;
//!
//! let report = execute_simple(&mut graph, &ExecuteOptions::default())?;
//! println!("{}", report.output("RuntimeArn").unwrap_or_default());
//! ```
//!
//! ## Node Lifecycle
//!
//! Every node moves `Pending → Resolving → Applied`, or
//! `Pending → Resolving → Failed`. Cycles and invalid nodes are rejected
//! before any node leaves `Pending`. A failure stops the walk; nodes that
//! were already applied are left as they are.
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmation before the first side effect

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod resolve;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use error::{ApplyError, Error, ErrorCategory, Result};
pub use executor::{execute, execute_simple};
pub use graph::{Node, ResourceGraph};
pub use planner::{ExecutionPlan, plan, validate};
pub use resolve::ResolutionTable;
pub use resource::{BoxedResource, Resource};
pub use types::{
    ApplyReport, ApplyStatus, DependencyEdge, EdgeOrigin, ExecuteOptions, NodeKind, NodeState,
    OutputBinding, Outputs, Properties, PropertyValue, Reference, ResolvedOutput,
    ResolvedProperties,
};
