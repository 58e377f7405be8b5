//! Core types for the resource graph

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a resource node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A built container image
    Image,
    /// An execution identity (role)
    Identity,
    /// A standalone permission statement set
    PermissionStatement,
    /// A managed runtime
    Runtime,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Identity => "identity",
            Self::PermissionStatement => "permission_statement",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a node within a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Pending,
    Resolving,
    Applied,
    Failed,
}

impl NodeState {
    /// Whether the node can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Failed)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Applied => "applied",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A reference to an output field of another node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    pub node: String,
    pub field: String,
}

impl Reference {
    pub fn new(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.node, self.field)
    }
}

/// A declared property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A value known at declaration time
    Literal(String),
    /// A value produced by another node once it is applied
    Ref(Reference),
}

impl PropertyValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Ref(Reference::new(node, field))
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Ref(r) => Some(r),
            Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.write_str(v),
            Self::Ref(r) => r.fmt(f),
        }
    }
}

/// Declared properties of a node, keyed by property name
///
/// A `BTreeMap` keeps scanning order stable, which keeps implicit edge
/// order stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal property
    pub fn literal(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), PropertyValue::literal(value));
        self
    }

    /// Add a property referencing another node's output
    pub fn reference(
        mut self,
        name: impl Into<String>,
        node: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.0.insert(name.into(), PropertyValue::reference(node, field));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// All unresolved references, in property-name order
    pub fn references(&self) -> impl Iterator<Item = (&String, &Reference)> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name, r)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Properties with every reference substituted by its resolved value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProperties(BTreeMap<String, String>);

impl ResolvedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Get a property that must be present
    ///
    /// A missing property means a dependency never reached `Applied`,
    /// which is reported as a provisioning error.
    pub fn require(&self, name: &str) -> Result<&str, crate::ApplyError> {
        self.get(name).ok_or_else(|| {
            crate::ApplyError::Provisioning(format!("property '{name}' was never resolved"))
        })
    }

    /// All properties whose name starts with `prefix`, with the prefix stripped
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix).map(|rest| (rest, v.as_str()))
        })
    }
}

/// Output fields produced by a node's creation contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs(BTreeMap<String, String>);

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Outputs {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Where a dependency edge came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeOrigin {
    /// Declared with `ResourceGraph::add_dependency`
    Explicit,
    /// Implied by a property referencing another node
    Implicit { property: String },
}

/// `from` must be applied before `to` is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub origin: EdgeOrigin,
}

impl DependencyEdge {
    pub fn is_explicit(&self) -> bool {
        matches!(self.origin, EdgeOrigin::Explicit)
    }
}

/// A named output read from an applied node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub name: String,
    pub node: String,
    pub field: String,
}

/// An output binding with its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOutput {
    pub name: String,
    pub value: String,
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Validate and order the graph without applying anything
    pub dry_run: bool,
    /// Number of nodes that may be applied at once within a wave
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
            verbose: false,
        }
    }
}

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyStatus {
    /// Every node was applied and outputs were materialized
    Applied,
    /// Planned only
    DryRun,
    /// The confirmation callback declined
    Declined,
}

/// Result of a successful (or intentionally skipped) execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub status: ApplyStatus,
    /// Node ids in the order they were (or would be) applied
    pub order: Vec<String>,
    /// Output values, empty unless `status` is `Applied`
    pub outputs: Vec<ResolvedOutput>,
}

impl ApplyReport {
    pub fn is_applied(&self) -> bool {
        self.status == ApplyStatus::Applied
    }

    /// Look up an output value by name
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }
}
