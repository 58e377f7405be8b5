//! `voicestack plan` - show the graph without applying it

use anyhow::Result;
use colored::Colorize;
use declarative::{EdgeOrigin, NodeState, ResourceGraph};

use crate::Context;
use crate::cli::TargetArgs;
use crate::stack;
use crate::ui;

pub fn run(ctx: &Context, args: TargetArgs) -> Result<()> {
    let (config, config_path) = super::load_config(ctx)?;
    let target = super::resolve_target(&args, &config)?;
    let backends = super::backends(&args, &target);
    let graph = stack::build_graph(&config, config_path.as_deref(), &target, &backends)?;

    let plan = declarative::plan(&graph)?;

    ui::stack_header("Plan for", &config.stack.name);
    ui::kv("region", &target.region);
    ui::kv("account", &target.account);
    ui::kv("backend", args.backend.as_str());

    print_nodes(&graph);

    ui::section("Dependencies");
    for edge in &plan.edges {
        let origin = match &edge.origin {
            EdgeOrigin::Explicit => "explicit".to_string(),
            EdgeOrigin::Implicit { property } => format!("via {property}"),
        };
        println!("  {} → {} {}", edge.from, edge.to, origin.dimmed());
    }

    ui::section("Apply order");
    let waves = plan.wave_ids(&graph);
    for (i, wave) in waves.iter().enumerate() {
        ui::wave(i + 1, waves.len(), wave);
    }

    ui::section("Outputs");
    for binding in graph.outputs() {
        ui::kv(&binding.name, &format!("{}.{}", binding.node, binding.field));
    }

    println!();
    match declarative::validate(&graph) {
        Ok(()) => ui::note(&format!("{} resources ready to deploy", plan.len())),
        Err(e) => {
            ui::state_line(NodeState::Failed, &e.to_string());
            ui::category_hint(e.category());
            return Err(e.into());
        }
    }
    Ok(())
}

fn print_nodes(graph: &ResourceGraph) {
    ui::section("Resources");
    for node in graph.nodes() {
        println!(
            "  {} {} {}",
            ui::state_symbol(node.state()),
            ui::kind_label(node.kind()),
            node.id().bold()
        );
        ui::dim(&node.resource().description());
    }
}
