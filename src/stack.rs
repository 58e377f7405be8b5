//! Stack assembly - turns a config into a resource graph

use anyhow::Result;
use std::fmt;
use std::path::Path;

use crate::config::StackConfig;
use crate::resource::{Backends, ImageResource, RoleResource, RuntimeResource, fields};
use agentcore::{Authorizer, BuildRequest, NetworkMode, Protocol};
use declarative::{ApplyError, NodeKind, ResourceGraph};
use iamkit::{PermissionStatement, Principal, Scope};

/// Output published after a successful deploy
pub const RUNTIME_ARN_OUTPUT: &str = "AgentCoreRuntimeArn";

/// Where the stack is deployed, resolved once at the CLI boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl Target {
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            partition: "aws".to_string(),
            region: region.into(),
            account: account.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(&self.region, &self.account).with_partition(&self.partition)
    }
}

/// Configuration error on a node, raised while the stack is assembled
fn invalid(node: &str, kind: NodeKind, message: impl fmt::Display) -> declarative::Error {
    declarative::Error::InvalidNode {
        node: node.to_string(),
        kind,
        source: ApplyError::Configuration(message.to_string()),
    }
}

/// Permission statements for the configured capabilities
pub fn statements(
    config: &StackConfig,
    target: &Target,
) -> declarative::Result<Vec<PermissionStatement>> {
    iamkit::synthesize_named(&config.identity.capabilities, &target.scope())
        .map_err(|e| invalid(&config.identity.id, NodeKind::Identity, e))
}

/// Build the image → role → runtime graph
///
/// The runtime references the image URI and role ARN, and additionally
/// depends on the role explicitly.
pub fn build_graph(
    config: &StackConfig,
    config_path: Option<&Path>,
    target: &Target,
    backends: &Backends,
) -> Result<ResourceGraph> {
    let image = ImageResource::new(
        &config.image.id,
        BuildRequest {
            context_dir: config.source_dir(config_path)?,
            platform: config.image.platform.clone(),
            build_file: config.image.build_file.clone(),
            repository: config.image.repository.clone(),
            push: config.image.push,
        },
        backends.images.clone(),
    );

    let role = RoleResource::new(
        &config.identity.id,
        config.role_name(),
        Principal::parse(&config.identity.principal),
        statements(config, target)?,
        backends.identity.clone(),
    )
    .with_description(&config.identity.description)
    .with_policy_name(config.policy_name());

    let runtime_invalid = |e: &dyn fmt::Display| invalid(&config.runtime.id, NodeKind::Runtime, e);
    let protocol: Protocol = config
        .runtime
        .protocol
        .parse()
        .map_err(|e| runtime_invalid(&e))?;
    let network_mode: NetworkMode = config
        .runtime
        .network_mode
        .parse()
        .map_err(|e| runtime_invalid(&e))?;
    let environment = config
        .runtime
        .environment_for(&target.region)
        .map_err(|e| runtime_invalid(&e))?;
    let authorizer = config
        .runtime
        .authorizer
        .as_ref()
        .map_or(Authorizer::None, |a| Authorizer::CustomJwt {
            discovery_url: a.discovery_url.clone(),
            allowed_clients: a.allowed_clients.clone(),
        });

    let runtime = RuntimeResource::new(
        &config.runtime.id,
        &config.runtime.name,
        &config.image.id,
        &config.identity.id,
        backends.runtime.clone(),
    )
    .with_protocol(protocol)
    .with_network_mode(network_mode)
    .with_environment(environment)
    .with_authorizer(authorizer);

    let mut graph = ResourceGraph::new();
    graph.add_resource(Box::new(image))?;
    graph.add_resource(Box::new(role))?;
    graph.add_resource(Box::new(runtime))?;
    graph.add_dependency(&config.identity.id, &config.runtime.id)?;
    graph.add_output(RUNTIME_ARN_OUTPUT, &config.runtime.id, fields::RUNTIME_ARN)?;

    log::debug!(
        "assembled stack {} with {} nodes via {}",
        config.stack.name,
        graph.len(),
        backends.describe()
    );
    Ok(graph)
}
