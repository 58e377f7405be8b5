//! Resource trait for graph nodes
//!
//! A Resource declares its properties (some of them references into other
//! nodes' outputs) and knows how to create itself once those references
//! are resolved.

use crate::context::ApplyContext;
use crate::error::ApplyError;
use crate::types::{NodeKind, Outputs, Properties};
use std::fmt;

/// Core trait for provisionable resources
///
/// Every node in a [`ResourceGraph`](crate::ResourceGraph) wraps one
/// resource, which provides:
/// - Identity (id, kind, description)
/// - Declared properties, including references to other nodes
/// - A pure validation hook
/// - The creation contract (apply)
///
/// # Example
///
/// ```ignore
/// use declarative::{
///     ApplyContext, ApplyError, NodeKind, Outputs, Properties, Resource,
/// };
///
/// #[derive(Debug)]
/// struct Bucket { name: String }
///
/// impl Resource for Bucket {
///     fn id(&self) -> String { self.name.clone() }
///     fn kind(&self) -> NodeKind { NodeKind::Image }
///     fn description(&self) -> String { format!("Bucket {}", self.name) }
///
///     fn properties(&self) -> Properties {
///         Properties::new().literal("name", &self.name)
///     }
///
///     fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError> {
///         let name = ctx.properties.require("name")?;
///         Ok(Outputs::new().with("arn", format!("arn:bucket:{name}")))
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Logical id, unique within the graph
    fn id(&self) -> String;

    /// Kind tag used for reporting and filtering
    fn kind(&self) -> NodeKind;

    /// Human-readable description of what this resource creates
    fn description(&self) -> String;

    /// Declared properties
    ///
    /// Every [`PropertyValue::Ref`](crate::PropertyValue::Ref) becomes an
    /// implicit dependency edge from the referenced node to this one.
    fn properties(&self) -> Properties;

    /// Check the resource's own inputs without side effects
    ///
    /// Called for every node before any node is applied, so a failure here
    /// aborts the run with nothing created.
    fn validate(&self) -> Result<(), ApplyError> {
        Ok(())
    }

    /// Create the resource
    ///
    /// `ctx.properties` holds every declared property with references
    /// substituted. The returned outputs are recorded in the resolution
    /// table and may be referenced by later nodes.
    fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
