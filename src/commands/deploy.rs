//! `voicestack deploy` - provision the stack

use anyhow::Result;
use declarative::{
    ApplyStatus, AutoConfirm, ConfirmCallback, ExecuteOptions, NodeState, ResourceGraph, execute,
};

use crate::Context;
use crate::cli::DeployArgs;
use crate::config::expand_path;
use crate::progress::DeployProgress;
use crate::report::DeploymentReport;
use crate::stack::{self, RUNTIME_ARN_OUTPUT};
use crate::ui;

/// Asks on the terminal before the first resource is created
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

pub fn run(ctx: &Context, args: DeployArgs) -> Result<()> {
    let (mut config, config_path) = super::load_config(ctx)?;
    if args.no_push {
        config.image.push = false;
    }

    let target = super::resolve_target(&args.target, &config)?;
    let backends = super::backends(&args.target, &target);

    if !ctx.quiet {
        ui::stack_header("Deploying", &config.stack.name);
        ui::kv("region", &target.region);
        ui::kv("account", &target.account);
        ui::kv("backend", args.target.backend.as_str());
        if let Some(path) = &config_path {
            ui::kv("config", &path.display().to_string());
        }
    }

    if !args.dry_run {
        super::ensure_tools(&args.target, &target)?;
    }

    let mut graph = match stack::build_graph(&config, config_path.as_deref(), &target, &backends) {
        Ok(graph) => graph,
        Err(e) => {
            if let Some(err) = e.downcast_ref::<declarative::Error>() {
                println!();
                ui::category_hint(err.category());
            }
            return Err(e);
        }
    };
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
        verbose: ctx.verbose > 0,
    };

    let mut progress = DeployProgress::new(ctx.quiet);
    let result = if args.yes {
        execute(&mut graph, &opts, &mut progress, &mut AutoConfirm)
    } else {
        execute(&mut graph, &opts, &mut progress, &mut PromptConfirm)
    };
    drop(progress);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            print_failure(&graph, &e);
            return Err(e.into());
        }
    };

    match report.status {
        ApplyStatus::DryRun => {
            println!();
            ui::note("Dry run - no changes made");
        }
        ApplyStatus::Declined => {
            println!();
            ui::state_line(NodeState::Pending, "Aborted - nothing was created");
        }
        ApplyStatus::Applied => {
            let record = DeploymentReport::new(
                &config.stack.name,
                &target,
                args.target.backend.as_str(),
                &report,
            );
            let path = match &args.outputs_file {
                Some(path) => path.clone(),
                None => expand_path(&config.stack.report_file)?,
            };
            record.save(&path)?;

            if !ctx.quiet {
                println!();
                ui::state_line(NodeState::Applied, &format!("{} deployed", config.stack.name));
                ui::section("Outputs");
            }
            for output in &report.outputs {
                println!("{} = {}", output.name, output.value);
            }
            if !ctx.quiet {
                ui::dim(&format!("Report written to {}", path.display()));
            }
            if report.output(RUNTIME_ARN_OUTPUT).is_none() {
                log::warn!("{RUNTIME_ARN_OUTPUT} was not produced");
            }
        }
    }

    Ok(())
}

/// Show where the walk stopped and what to do about it
fn print_failure(graph: &ResourceGraph, err: &declarative::Error) {
    println!();
    ui::section("Resources");
    for node in graph.nodes() {
        println!(
            "  {} {} {}",
            ui::state_symbol(node.state()),
            ui::kind_label(node.kind()),
            node.id()
        );
    }
    println!();
    ui::category_hint(err.category());
}
