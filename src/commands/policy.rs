//! `voicestack policy` - print the role's policies as IAM JSON

use anyhow::{Context as _, Result};
use iamkit::{PolicyDocument, Principal, TrustPolicy};

use crate::Context;
use crate::cli::PolicyArgs;
use crate::stack;

pub fn run(ctx: &Context, args: PolicyArgs) -> Result<()> {
    let (config, _) = super::load_config(ctx)?;
    let target = super::resolve_target(&args.target, &config)?;

    let document = PolicyDocument::new(stack::statements(&config, &target)?);
    let trust = TrustPolicy::new(Principal::parse(&config.identity.principal))
        .with_partition(&target.partition);

    if args.trust {
        println!("{}", pretty(&trust.to_value())?);
        return Ok(());
    }
    let identity = document
        .to_json_pretty()
        .context("Could not render identity policy")?;
    if args.identity {
        println!("{identity}");
        return Ok(());
    }

    if !ctx.quiet {
        eprintln!("// identity policy: {}", config.policy_name());
    }
    println!("{identity}");
    if !ctx.quiet {
        eprintln!("// trust policy: {}", config.role_name());
    }
    println!("{}", pretty(&trust.to_value())?);
    Ok(())
}

fn pretty(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Could not render trust policy")
}
