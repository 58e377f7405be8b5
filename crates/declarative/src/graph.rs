//! Resource graph - node registry, explicit edges and output bindings

use crate::error::{Error, Result};
use crate::resource::{BoxedResource, Resource};
use crate::types::{DependencyEdge, EdgeOrigin, NodeKind, NodeState, OutputBinding, Properties};
use std::collections::HashMap;

/// A registered node
#[derive(Debug)]
pub struct Node {
    resource: BoxedResource,
    properties: Properties,
    state: NodeState,
}

impl Node {
    pub fn id(&self) -> String {
        self.resource.id()
    }

    pub fn kind(&self) -> NodeKind {
        self.resource.kind()
    }

    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Properties captured at registration
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn state(&self) -> NodeState {
        self.state
    }
}

/// The set of nodes to provision, their ordering constraints, and the
/// outputs to report once everything is applied
///
/// Nodes keep their registration order, which is the tie-break between
/// independent nodes when the apply order is computed.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    explicit: Vec<(usize, usize)>,
    outputs: Vec<OutputBinding>,
}

impl ResourceGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource as a `Pending` node
    pub fn add_resource(&mut self, resource: BoxedResource) -> Result<()> {
        let id = resource.id();
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        let properties = resource.properties();
        log::debug!(
            "registered {} node '{}' with {} properties",
            resource.kind(),
            id,
            properties.len()
        );
        self.index.insert(id, self.nodes.len());
        self.nodes.push(Node {
            resource,
            properties,
            state: NodeState::Pending,
        });
        Ok(())
    }

    /// Declare that `to` must not be resolved before `from` is applied
    ///
    /// This is kept even when `to` already references `from` through a
    /// property; both edges are reported.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<()> {
        let context = format!("dependency {from} -> {to}");
        let f = self.lookup(from, &context)?;
        let t = self.lookup(to, &context)?;
        self.explicit.push((f, t));
        Ok(())
    }

    /// Declare a named output read from `node.field` after apply
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        node: impl Into<String>,
        field: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        let node = node.into();
        if self.outputs.iter().any(|o| o.name == name) {
            return Err(Error::DuplicateOutput(name));
        }
        self.lookup(&node, &format!("output '{name}'"))?;
        self.outputs.push(OutputBinding {
            name,
            node,
            field: field.into(),
        });
        Ok(())
    }

    /// Nodes in registration order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Current lifecycle state of a node
    pub fn state(&self, id: &str) -> Option<NodeState> {
        self.node(id).map(Node::state)
    }

    /// Declared output bindings
    pub fn outputs(&self) -> &[OutputBinding] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All dependency edges: explicit ones in declaration order, then one
    /// implicit edge per reference, in registration and property order
    pub fn edges(&self) -> Result<Vec<DependencyEdge>> {
        Ok(self
            .edge_indices()?
            .into_iter()
            .map(|(from, to, origin)| DependencyEdge {
                from: self.nodes[from].id(),
                to: self.nodes[to].id(),
                origin,
            })
            .collect())
    }

    pub(crate) fn edge_indices(&self) -> Result<Vec<(usize, usize, EdgeOrigin)>> {
        let mut edges: Vec<_> = self
            .explicit
            .iter()
            .map(|&(f, t)| (f, t, EdgeOrigin::Explicit))
            .collect();

        for (to, node) in self.nodes.iter().enumerate() {
            for (property, reference) in node.properties.references() {
                let context = format!("property '{}' of '{}'", property, node.id());
                let from = self.lookup(&reference.node, &context)?;
                edges.push((
                    from,
                    to,
                    EdgeOrigin::Implicit {
                        property: property.clone(),
                    },
                ));
            }
        }
        Ok(edges)
    }

    pub(crate) fn node_at(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn set_state(&mut self, index: usize, state: NodeState) {
        let node = &mut self.nodes[index];
        log::trace!("{}: {} -> {}", node.id(), node.state, state);
        node.state = state;
    }

    fn lookup(&self, id: &str, context: &str) -> Result<usize> {
        self.index_of(id).ok_or_else(|| Error::UnknownNode {
            node: id.to_string(),
            context: context.to_string(),
        })
    }
}
