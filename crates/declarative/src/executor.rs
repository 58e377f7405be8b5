//! Execution engine - applies a resource graph in dependency order

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::error::{ApplyError, Error, Result};
use crate::graph::ResourceGraph;
use crate::planner::{self, ExecutionPlan};
use crate::resolve::ResolutionTable;
use crate::resource::Resource;
use crate::types::{
    ApplyReport, ApplyStatus, ExecuteOptions, NodeState, Outputs, ResolvedOutput,
    ResolvedProperties,
};
use rayon::prelude::*;

/// Execute a graph with the given options and callbacks
///
/// # Arguments
/// * `graph` - The graph to apply; node states are updated in place
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Asked once, after validation and before the first side effect
///
/// # Returns
/// A report with the apply order and materialized outputs. Configuration
/// and cycle errors are returned before any node leaves `Pending`; a node
/// failure aborts the walk and leaves already-applied nodes in place.
pub fn execute<P, C>(
    graph: &mut ResourceGraph,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ApplyReport>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let plan = planner::plan(graph)?;
    planner::validate(graph)?;
    progress.on_plan(&plan.ids);

    if opts.dry_run {
        return Ok(ApplyReport {
            status: ApplyStatus::DryRun,
            order: plan.ids,
            outputs: Vec::new(),
        });
    }

    let prompt = format!("Provision {} resources?", plan.len());
    if !confirm
        .confirm(&prompt)
        .map_err(|e| Error::Confirm(e.to_string()))?
    {
        return Ok(ApplyReport {
            status: ApplyStatus::Declined,
            order: plan.ids,
            outputs: Vec::new(),
        });
    }

    let mut table = ResolutionTable::new();
    let order = if opts.jobs <= 1 {
        apply_sequential(graph, &plan, &mut table, opts.verbose, progress)?
    } else {
        apply_waves(graph, &plan, &mut table, opts, progress)?
    };

    let outputs = materialize(graph, &table)?;
    log::info!(
        "applied {} nodes, {} outputs",
        order.len(),
        outputs.len()
    );

    Ok(ApplyReport {
        status: ApplyStatus::Applied,
        order,
        outputs,
    })
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(graph: &mut ResourceGraph, opts: &ExecuteOptions) -> Result<ApplyReport> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(graph, opts, &mut NoProgress, &mut AutoConfirm)
}

/// Apply nodes one at a time in plan order
fn apply_sequential<P: ProgressCallback>(
    graph: &mut ResourceGraph,
    plan: &ExecutionPlan,
    table: &mut ResolutionTable,
    verbose: bool,
    progress: &mut P,
) -> Result<Vec<String>> {
    let mut applied = Vec::with_capacity(plan.len());

    for &index in &plan.order {
        let (id, kind, description) = {
            let node = graph.node_at(index);
            (node.id(), node.kind(), node.resource().description())
        };

        graph.set_state(index, NodeState::Resolving);
        progress.on_node_start(&id, kind, &description);

        let result = {
            let node = graph.node_at(index);
            table
                .resolve(node.properties())
                .and_then(|props| apply_resource(node.resource(), &id, &props, verbose))
        };

        complete_node(graph, table, index, &id, result, progress)?;
        applied.push(id);
    }

    Ok(applied)
}

/// Apply nodes wave by wave, running each wave on a rayon pool
///
/// References are resolved on the driving thread before a wave starts, so
/// the resolution table is only ever written from one thread.
fn apply_waves<P: ProgressCallback>(
    graph: &mut ResourceGraph,
    plan: &ExecutionPlan,
    table: &mut ResolutionTable,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<Vec<String>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .map_err(|e| Error::Other(format!("Failed to create thread pool: {e}")))?;

    let mut applied = Vec::with_capacity(plan.len());

    for wave in &plan.waves {
        let mut jobs: Vec<(usize, String, ResolvedProperties)> = Vec::with_capacity(wave.len());
        for &index in wave {
            let node = graph.node_at(index);
            let id = node.id();
            match table.resolve(node.properties()) {
                Ok(props) => jobs.push((index, id, props)),
                Err(source) => {
                    let kind = node.kind();
                    graph.set_state(index, NodeState::Resolving);
                    graph.set_state(index, NodeState::Failed);
                    progress.on_node_failed(&id, &source);
                    return Err(Error::NodeFailed {
                        node: id,
                        kind,
                        source,
                    });
                }
            }
        }

        for (index, id, _) in &jobs {
            graph.set_state(*index, NodeState::Resolving);
            let node = graph.node_at(*index);
            progress.on_node_start(id, node.kind(), &node.resource().description());
        }

        let results: Vec<(usize, String, std::result::Result<Outputs, ApplyError>)> = {
            let shared: &ResourceGraph = graph;
            pool.install(|| {
                jobs.par_iter()
                    .map(|(index, id, props)| {
                        let resource = shared.node_at(*index).resource();
                        (*index, id.clone(), apply_resource(resource, id, props, opts.verbose))
                    })
                    .collect()
            })
        };

        // Every node in the wave ran to completion; record all of them
        // before reporting the first failure.
        let mut first_error = None;
        for (index, id, result) in results {
            match complete_node(graph, table, index, &id, result, progress) {
                Ok(()) => applied.push(id),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    Ok(applied)
}

/// Record a node's result and move it to its terminal state
fn complete_node<P: ProgressCallback>(
    graph: &mut ResourceGraph,
    table: &mut ResolutionTable,
    index: usize,
    id: &str,
    result: std::result::Result<Outputs, ApplyError>,
    progress: &mut P,
) -> Result<()> {
    match result {
        Ok(outputs) => {
            if let Err(e) = table.record(id, outputs.clone()) {
                graph.set_state(index, NodeState::Failed);
                progress.on_node_failed(id, &ApplyError::Provisioning(e.to_string()));
                return Err(e);
            }
            graph.set_state(index, NodeState::Applied);
            progress.on_node_applied(id, &outputs);
            log::debug!("{id}: applied");
            Ok(())
        }
        Err(source) => {
            graph.set_state(index, NodeState::Failed);
            progress.on_node_failed(id, &source);
            log::error!("{id}: {source}");
            Err(Error::NodeFailed {
                node: id.to_string(),
                kind: graph.node_at(index).kind(),
                source,
            })
        }
    }
}

/// Apply a single resource
fn apply_resource(
    resource: &dyn Resource,
    id: &str,
    props: &ResolvedProperties,
    verbose: bool,
) -> std::result::Result<Outputs, ApplyError> {
    let ctx = ApplyContext::new(id, props, verbose);
    resource.apply(&ctx)
}

/// Read every output binding from the resolution table
fn materialize(graph: &ResourceGraph, table: &ResolutionTable) -> Result<Vec<ResolvedOutput>> {
    graph
        .outputs()
        .iter()
        .map(|binding| {
            table
                .get(&binding.node, &binding.field)
                .map(|value| ResolvedOutput {
                    name: binding.name.clone(),
                    value: value.to_string(),
                })
                .ok_or_else(|| Error::MissingOutput {
                    name: binding.name.clone(),
                    node: binding.node.clone(),
                    field: binding.field.clone(),
                })
        })
        .collect()
}
