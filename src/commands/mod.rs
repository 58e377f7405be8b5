pub mod deploy;
pub mod outputs;
pub mod plan;
pub mod policy;

use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use crate::Context;
use crate::cli::{BackendKind, TargetArgs};
use crate::config::StackConfig;
use crate::resource::Backends;
use crate::stack::Target;
use agentcore::{AwsCli, DockerCli, EcrRegistry, Simulated};

/// Account used by the simulated backend when none is configured
pub const SIMULATED_ACCOUNT: &str = "000000000000";

/// Load the stack config named on the command line, or discover one
pub fn load_config(ctx: &Context) -> Result<(StackConfig, Option<PathBuf>)> {
    StackConfig::discover(ctx.config.as_deref())
}

/// Resolve region and account: flag or env, then config, then a lookup
pub fn resolve_target(args: &TargetArgs, config: &StackConfig) -> Result<Target> {
    let Some(region) = args.region.clone().or_else(|| config.stack.region.clone()) else {
        bail!("No region configured: pass --region, set AWS_REGION, or set stack.region");
    };

    let account = match args.account.clone().or_else(|| config.stack.account.clone()) {
        Some(account) => account,
        None => match args.backend {
            BackendKind::Aws => {
                log::info!("looking up account id for region {region}");
                aws_cli(args, &region)
                    .caller_account()
                    .context("Could not determine account id; pass --account")?
            }
            BackendKind::Simulated => SIMULATED_ACCOUNT.to_string(),
        },
    };

    let target = Target::new(region, account);
    target
        .scope()
        .validate()
        .context("Invalid deploy target")?;
    Ok(target)
}

/// Build the backends selected on the command line
pub fn backends(args: &TargetArgs, target: &Target) -> Backends {
    match args.backend {
        BackendKind::Aws => {
            let aws = aws_cli(args, &target.region);
            let registry = EcrRegistry::new(aws.clone(), &target.account);
            let aws = Arc::new(aws);
            Backends {
                images: Arc::new(DockerCli::new().with_registry(registry)),
                identity: aws.clone(),
                runtime: aws,
            }
        }
        BackendKind::Simulated => {
            Backends::uniform(Simulated::new(&target.region, &target.account))
        }
    }
}

fn aws_cli(args: &TargetArgs, region: &str) -> AwsCli {
    AwsCli::new(region).with_profile(args.profile.clone())
}

/// Fail early if the external tools a backend shells out to are missing
pub fn ensure_tools(args: &TargetArgs, target: &Target) -> Result<()> {
    if args.backend == BackendKind::Aws {
        DockerCli::new().ensure_available()?;
        aws_cli(args, &target.region).ensure_available()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(backend: BackendKind) -> TargetArgs {
        TargetArgs {
            region: None,
            account: None,
            profile: None,
            backend,
        }
    }

    #[test]
    fn test_region_required() {
        let err = resolve_target(&args(BackendKind::Simulated), &StackConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = StackConfig::default();
        config.stack.region = Some("us-west-2".to_string());
        config.stack.account = Some("111111111111".to_string());

        let mut target_args = args(BackendKind::Simulated);
        let target = resolve_target(&target_args, &config).unwrap();
        assert_eq!(target, Target::new("us-west-2", "111111111111"));

        target_args.region = Some("eu-west-1".to_string());
        target_args.account = Some("222222222222".to_string());
        let target = resolve_target(&target_args, &config).unwrap();
        assert_eq!(target, Target::new("eu-west-1", "222222222222"));
    }

    #[test]
    fn test_simulated_account_fallback() {
        let mut target_args = args(BackendKind::Simulated);
        target_args.region = Some("us-east-1".to_string());
        let target = resolve_target(&target_args, &StackConfig::default()).unwrap();
        assert_eq!(target.account, SIMULATED_ACCOUNT);
    }

    #[test]
    fn test_invalid_account_rejected() {
        let mut target_args = args(BackendKind::Simulated);
        target_args.region = Some("us-east-1".to_string());
        target_args.account = Some("12345".to_string());
        assert!(resolve_target(&target_args, &StackConfig::default()).is_err());
    }

    #[test]
    fn test_backend_selection() {
        let target = Target::new("us-east-1", "123456789012");
        let sim = backends(&args(BackendKind::Simulated), &target);
        assert_eq!(sim.images.name(), "simulated");

        let aws = backends(&args(BackendKind::Aws), &target);
        assert_eq!(aws.images.name(), "docker");
        assert_eq!(aws.runtime.name(), "aws");
    }
}
