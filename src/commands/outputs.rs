//! `voicestack outputs` - read back the last deployment report

use anyhow::{Context as _, Result, bail};

use crate::Context;
use crate::cli::OutputsArgs;
use crate::config::expand_path;
use crate::report::DeploymentReport;
use crate::ui;

pub fn run(ctx: &Context, args: OutputsArgs) -> Result<()> {
    let path = match args.file {
        Some(path) => path,
        None => {
            let (config, _) = super::load_config(ctx)?;
            expand_path(&config.stack.report_file)?
        }
    };
    let report = DeploymentReport::load(&path)
        .with_context(|| format!("No deployment report at {}; run deploy first", path.display()))?;

    if let Some(name) = &args.name {
        let Some(value) = report.output(name) else {
            bail!("No output named '{name}' in {}", path.display());
        };
        println!("{value}");
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::stack_header("Deployed", &report.stack);
    ui::kv("region", &report.region);
    ui::kv("account", &report.account);
    ui::kv("backend", &report.backend);
    ui::kv("deployed", &report.deployed_at.to_rfc3339());
    ui::kv("order", &report.order.join(" → "));

    ui::section("Outputs");
    for output in &report.outputs {
        ui::kv(&output.name, &output.value);
    }
    Ok(())
}
