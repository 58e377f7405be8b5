//! Execution planner - orders a resource graph for apply

use crate::error::{Error, Result};
use crate::graph::ResourceGraph;
use crate::types::DependencyEdge;
use std::collections::BTreeSet;

/// A validated apply order for a graph
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Node indices in topological order, ties broken by registration order
    pub(crate) order: Vec<usize>,
    /// Node indices grouped by depth; every node's predecessors sit in
    /// earlier waves
    pub(crate) waves: Vec<Vec<usize>>,
    /// Node ids in apply order
    pub ids: Vec<String>,
    /// Every edge considered, explicit and implicit
    pub edges: Vec<DependencyEdge>,
}

impl ExecutionPlan {
    /// Node ids grouped by wave
    pub fn wave_ids(&self, graph: &ResourceGraph) -> Vec<Vec<String>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|&i| graph.node_at(i).id()).collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compute the apply order for `graph`
///
/// Uses Kahn's algorithm with the lowest registration index taken first
/// among ready nodes, so an unchanged graph always yields the same order.
/// Nothing in the graph is mutated; a cycle is reported before any node
/// leaves `Pending`.
pub fn plan(graph: &ResourceGraph) -> Result<ExecutionPlan> {
    let edges = graph.edge_indices()?;
    let n = graph.len();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for &(from, to, _) in &edges {
        successors[from].push(to);
        predecessors[to].push(from);
        in_degree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut depth = vec![0usize; n];

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &succ in &successors[next] {
            depth[succ] = depth[succ].max(depth[next] + 1);
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if order.len() < n {
        let remaining: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
        let cycle = find_cycle(&predecessors, &remaining)
            .into_iter()
            .map(|i| graph.node_at(i).id())
            .collect();
        return Err(Error::Cycle { cycle });
    }

    let wave_count = order.iter().map(|&i| depth[i] + 1).max().unwrap_or(0);
    let mut waves = vec![Vec::new(); wave_count];
    for i in 0..n {
        waves[depth[i]].push(i);
    }

    let ids = order.iter().map(|&i| graph.node_at(i).id()).collect();
    let edges = graph.edges()?;

    log::debug!("planned {} nodes in {} waves", n, wave_count);

    Ok(ExecutionPlan {
        order,
        waves,
        ids,
        edges,
    })
}

/// Find one cycle among the nodes Kahn's algorithm could not order
///
/// Every such node still has an unordered predecessor, so walking
/// predecessors from any of them must revisit a node.
fn find_cycle(predecessors: &[Vec<usize>], remaining: &[bool]) -> Vec<usize> {
    let Some(start) = remaining.iter().position(|&r| r) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(prev) = predecessors[current]
            .iter()
            .copied()
            .filter(|&p| remaining[p])
            .min()
        else {
            return path;
        };

        if let Some(pos) = path.iter().position(|&p| p == prev) {
            // path runs against the edges; reverse it to read forwards
            let mut cycle = vec![prev];
            cycle.extend(path[pos..].iter().rev().copied());
            return cycle;
        }
        path.push(prev);
        current = prev;
    }
}

/// Run every node's validation hook
///
/// Pure: called after planning and before any node is applied.
pub fn validate(graph: &ResourceGraph) -> Result<()> {
    for node in graph.nodes() {
        node.resource()
            .validate()
            .map_err(|source| Error::InvalidNode {
                node: node.id(),
                kind: node.kind(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubResource;
    use crate::types::NodeState;

    fn graph_of(nodes: Vec<StubResource>) -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        for node in nodes {
            graph.add_resource(node.boxed()).unwrap();
        }
        graph
    }

    #[test]
    fn test_independent_nodes_keep_registration_order() {
        let graph = graph_of(vec![
            StubResource::new("c"),
            StubResource::new("a"),
            StubResource::new("b"),
        ]);
        let plan = plan(&graph).unwrap();
        assert_eq!(plan.ids, vec!["c", "a", "b"]);
        assert_eq!(plan.waves.len(), 1);
    }

    #[test]
    fn test_references_order_predecessors_first() {
        let graph = graph_of(vec![
            StubResource::new("runtime")
                .referencing("containerUri", "image", "uri")
                .referencing("roleArn", "role", "arn"),
            StubResource::new("image"),
            StubResource::new("role"),
        ]);
        let plan = plan(&graph).unwrap();
        assert_eq!(plan.ids, vec!["image", "role", "runtime"]);
        assert_eq!(
            plan.wave_ids(&graph),
            vec![vec!["image", "role"], vec!["runtime"]]
        );
    }

    #[test]
    fn test_every_edge_respected_in_diamond() {
        let mut graph = graph_of(vec![
            StubResource::new("d")
                .referencing("x", "b", "arn")
                .referencing("y", "c", "arn"),
            StubResource::new("c").referencing("x", "a", "arn"),
            StubResource::new("b").referencing("x", "a", "arn"),
            StubResource::new("a"),
        ]);
        graph.add_dependency("c", "b").unwrap();

        let plan = plan(&graph).unwrap();
        let pos = |id: &str| plan.ids.iter().position(|x| x == id).unwrap();
        for edge in &plan.edges {
            assert!(pos(&edge.from) < pos(&edge.to), "{edge:?}");
        }
        assert_eq!(plan.ids, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let build = || {
            let mut graph = graph_of(vec![
                StubResource::new("runtime")
                    .referencing("containerUri", "image", "uri")
                    .referencing("roleArn", "role", "arn"),
                StubResource::new("role"),
                StubResource::new("image"),
                StubResource::new("extra"),
            ]);
            graph.add_dependency("role", "runtime").unwrap();
            graph
        };

        let first = plan(&build()).unwrap().ids;
        for _ in 0..10 {
            assert_eq!(plan(&build()).unwrap().ids, first);
        }
    }

    #[test]
    fn test_cycle_detected_without_state_change() {
        let graph = graph_of(vec![
            StubResource::new("a").referencing("x", "c", "arn"),
            StubResource::new("b").referencing("x", "a", "arn"),
            StubResource::new("c").referencing("x", "b", "arn"),
            StubResource::new("free"),
        ]);

        let err = plan(&graph).unwrap_err();
        match err {
            Error::Cycle { cycle } => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
                for id in ["a", "b", "c"] {
                    assert!(cycle.iter().any(|x| x == id));
                }
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        assert!(graph.nodes().iter().all(|n| n.state() == NodeState::Pending));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let mut graph = graph_of(vec![StubResource::new("a")]);
        graph.add_dependency("a", "a").unwrap();

        let err = plan(&graph).unwrap_err();
        assert!(matches!(err, Error::Cycle { cycle } if cycle == vec!["a", "a"]));
    }

    #[test]
    fn test_cycle_downstream_node_not_reported() {
        let mut graph = graph_of(vec![
            StubResource::new("a"),
            StubResource::new("b"),
            StubResource::new("tail").referencing("x", "b", "arn"),
        ]);
        graph.add_dependency("a", "b").unwrap();
        graph.add_dependency("b", "a").unwrap();

        match plan(&graph).unwrap_err() {
            Error::Cycle { cycle } => {
                assert!(!cycle.iter().any(|x| x == "tail"));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_reports_node_and_kind() {
        let graph = graph_of(vec![
            StubResource::new("ok"),
            StubResource::new("role")
                .kind(crate::NodeKind::Identity)
                .invalid(crate::ApplyError::Configuration("no statements".into())),
        ]);

        let err = validate(&graph).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidNode { ref node, kind: crate::NodeKind::Identity, .. } if node == "role"
        ));
    }
}
