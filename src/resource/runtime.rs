//! Agent runtime resource

use super::{fields, provisioning_error};
use agentcore::{Authorizer, NetworkMode, Protocol, RuntimeBackend, RuntimeRequest};
use declarative::{ApplyContext, ApplyError, NodeKind, Outputs, Properties, Resource};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Letter first, then up to 47 letters, digits or underscores
static RUNTIME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{0,47}$").expect("runtime name regex is valid")
});

const ENV_PREFIX: &str = "env.";

/// Creates the managed runtime that runs the agent image
pub struct RuntimeResource {
    id: String,
    name: String,
    image_node: String,
    role_node: String,
    network_mode: NetworkMode,
    protocol: Protocol,
    environment: BTreeMap<String, String>,
    authorizer: Authorizer,
    backend: Arc<dyn RuntimeBackend>,
}

impl RuntimeResource {
    /// A runtime running the image built by `image_node` as the role
    /// created by `role_node`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image_node: impl Into<String>,
        role_node: impl Into<String>,
        backend: Arc<dyn RuntimeBackend>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_node: image_node.into(),
            role_node: role_node.into(),
            network_mode: NetworkMode::default(),
            protocol: Protocol::default(),
            environment: BTreeMap::new(),
            authorizer: Authorizer::None,
            backend,
        }
    }

    pub fn with_network_mode(mut self, network_mode: NetworkMode) -> Self {
        self.network_mode = network_mode;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorizer = authorizer;
        self
    }
}

impl fmt::Debug for RuntimeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeResource")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("image_node", &self.image_node)
            .field("role_node", &self.role_node)
            .field("protocol", &self.protocol)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl Resource for RuntimeResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Runtime
    }

    fn description(&self) -> String {
        format!(
            "Create runtime {} ({}, {})",
            self.name, self.protocol, self.network_mode
        )
    }

    fn properties(&self) -> Properties {
        let mut props = Properties::new()
            .literal("name", &self.name)
            .literal("networkMode", self.network_mode.as_str())
            .literal("protocol", self.protocol.as_str())
            .reference("containerUri", &self.image_node, fields::IMAGE_URI)
            .reference("roleArn", &self.role_node, fields::ROLE_ARN);

        for (key, value) in &self.environment {
            props = props.literal(format!("{ENV_PREFIX}{key}"), value);
        }
        props
    }

    fn validate(&self) -> Result<(), ApplyError> {
        if !RUNTIME_NAME.is_match(&self.name) {
            return Err(ApplyError::Configuration(format!(
                "runtime name '{}' must start with a letter and contain at most 48 letters, digits or underscores",
                self.name
            )));
        }
        if let Some(key) = self.environment.keys().find(|k| k.trim().is_empty()) {
            return Err(ApplyError::Configuration(format!(
                "environment variable name '{key}' is empty"
            )));
        }
        if let Authorizer::CustomJwt {
            discovery_url,
            allowed_clients,
        } = &self.authorizer
        {
            if !discovery_url.starts_with("https://") {
                return Err(ApplyError::Configuration(format!(
                    "authorizer discovery URL must be https: '{discovery_url}'"
                )));
            }
            if allowed_clients.is_empty() {
                return Err(ApplyError::Configuration(
                    "authorizer has no allowed clients".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError> {
        let props = ctx.properties;
        let request = RuntimeRequest {
            name: props.require("name")?.to_string(),
            container_uri: props.require("containerUri")?.to_string(),
            role_arn: props.require("roleArn")?.to_string(),
            network_mode: self.network_mode,
            protocol: self.protocol,
            environment: props
                .with_prefix(ENV_PREFIX)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            authorizer: self.authorizer.clone(),
        };

        if ctx.verbose {
            log::info!(
                "{} runs {} as {}",
                ctx.node,
                request.container_uri,
                request.role_arn
            );
        }

        let runtime = self
            .backend
            .create_runtime(&request)
            .map_err(provisioning_error)?;

        Ok(Outputs::new()
            .with(fields::RUNTIME_ARN, runtime.arn)
            .with(fields::RUNTIME_ID, runtime.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore::{Error, RuntimeHandle};
    use declarative::{ResolutionTable, ResourceGraph};
    use std::sync::Mutex;

    /// Records requests instead of creating anything
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<RuntimeRequest>>,
    }

    impl RuntimeBackend for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn create_runtime(&self, request: &RuntimeRequest) -> agentcore::Result<RuntimeHandle> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(RuntimeHandle {
                arn: format!("arn:test:runtime/{}", request.name),
                id: request.name.clone(),
                version: None,
            })
        }
    }

    struct Failing;

    impl RuntimeBackend for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn create_runtime(&self, _request: &RuntimeRequest) -> agentcore::Result<RuntimeHandle> {
            Err(Error::from_command_output("aws", "create-agent-runtime", "AccessDenied"))
        }
    }

    fn runtime(name: &str, backend: Arc<dyn RuntimeBackend>) -> RuntimeResource {
        RuntimeResource::new("AgentCoreRuntime", name, "BackendAppAsset", "AgentCoreRole", backend)
            .with_environment(BTreeMap::from([
                ("MODEL_ID".to_string(), "amazon.nova-2-sonic-v1:0".to_string()),
                ("CHANNELS".to_string(), "1".to_string()),
            ]))
    }

    fn resolved_table() -> ResolutionTable {
        let mut table = ResolutionTable::new();
        table
            .insert("BackendAppAsset", fields::IMAGE_URI, "repo:abc".to_string())
            .unwrap();
        table
            .insert(
                "AgentCoreRole",
                fields::ROLE_ARN,
                "arn:aws:iam::123456789012:role/R".to_string(),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_name_validation() {
        let backend: Arc<dyn RuntimeBackend> = Arc::new(Recorder::default());
        assert!(runtime("Itsuki_AgentCoreRuntime", backend.clone()).validate().is_ok());
        assert!(runtime("a", backend.clone()).validate().is_ok());
        assert!(runtime(&"a".repeat(48), backend.clone()).validate().is_ok());

        let too_long = "a".repeat(49);
        for bad in ["", "1runtime", "voice-agent", "has space", too_long.as_str()] {
            assert!(
                matches!(
                    runtime(bad, backend.clone()).validate(),
                    Err(ApplyError::Configuration(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_authorizer_validation() {
        let backend: Arc<dyn RuntimeBackend> = Arc::new(Recorder::default());
        let no_clients = runtime("Voice", backend.clone()).with_authorizer(Authorizer::CustomJwt {
            discovery_url: "https://idp.example.com/.well-known/openid-configuration".into(),
            allowed_clients: Vec::new(),
        });
        assert!(no_clients.validate().is_err());

        let plain_http = runtime("Voice", backend).with_authorizer(Authorizer::CustomJwt {
            discovery_url: "http://idp.example.com".into(),
            allowed_clients: vec!["client".into()],
        });
        assert!(plain_http.validate().is_err());
    }

    #[test]
    fn test_references_become_edges() {
        let mut graph = ResourceGraph::new();
        graph
            .add_resource(Box::new(runtime("Voice", Arc::new(Recorder::default()))))
            .unwrap();
        // Referenced nodes are not registered
        assert!(graph.edges().is_err());

        let props = runtime("Voice", Arc::new(Recorder::default())).properties();
        let refs: Vec<_> = props
            .references()
            .map(|(name, r)| (name.as_str(), r.node.as_str(), r.field.as_str()))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("containerUri", "BackendAppAsset", fields::IMAGE_URI),
                ("roleArn", "AgentCoreRole", fields::ROLE_ARN),
            ]
        );
    }

    #[test]
    fn test_apply_passes_resolved_values() {
        let recorder = Arc::new(Recorder::default());
        let resource = runtime("Itsuki_AgentCoreRuntime", recorder.clone());
        let props = resolved_table().resolve(&resource.properties()).unwrap();

        let outputs = resource
            .apply(&ApplyContext::new("AgentCoreRuntime", &props, false))
            .unwrap();
        assert_eq!(
            outputs.get(fields::RUNTIME_ARN),
            Some("arn:test:runtime/Itsuki_AgentCoreRuntime")
        );
        assert_eq!(outputs.get(fields::RUNTIME_ID), Some("Itsuki_AgentCoreRuntime"));

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].container_uri, "repo:abc");
        assert_eq!(requests[0].role_arn, "arn:aws:iam::123456789012:role/R");
        assert_eq!(requests[0].environment["CHANNELS"], "1");
        assert_eq!(requests[0].environment.len(), 2);
    }

    #[test]
    fn test_unresolved_reference_is_provisioning_error() {
        let resource = runtime("Voice", Arc::new(Recorder::default()));
        let err = ResolutionTable::new()
            .resolve(&resource.properties())
            .unwrap_err();
        assert!(matches!(err, ApplyError::Provisioning(_)));
    }

    #[test]
    fn test_backend_failure_is_provisioning_error() {
        let resource = runtime("Voice", Arc::new(Failing));
        let props = resolved_table().resolve(&resource.properties()).unwrap();
        let err = resource
            .apply(&ApplyContext::new("AgentCoreRuntime", &props, false))
            .unwrap_err();
        assert!(matches!(err, ApplyError::Provisioning(m) if m.contains("create-agent-runtime")));
    }
}
