//! In-process backend that performs no remote calls.
//!
//! Builds still hash the real context directory, so a missing context or
//! build file fails exactly as it would with docker. Identifiers are
//! derived from the request contents and are stable across runs.

use crate::backend::{IdentityBackend, ImageBuilder, RuntimeBackend};
use crate::digest::context_digest;
use crate::error::Result;
use crate::types::{
    BuildRequest, ImageRef, RoleHandle, RoleRequest, RuntimeHandle, RuntimeRequest, ecr_registry,
};

/// Deterministic offline backend for plans, tests and local runs.
#[derive(Debug, Clone)]
pub struct Simulated {
    partition: String,
    region: String,
    account: String,
}

impl Simulated {
    /// Create a simulated backend for one account and region.
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            partition: "aws".to_string(),
            region: region.into(),
            account: account.into(),
        }
    }

    fn short_id(parts: &[&str]) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex()[..10].to_string()
    }
}

impl ImageBuilder for Simulated {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn build(&self, request: &BuildRequest) -> Result<ImageRef> {
        request.check_context()?;
        let digest = context_digest(&request.context_dir)?;
        let uri = request.image_uri(&ecr_registry(&self.account, &self.region), &digest);
        log::debug!("simulated build of {uri}");
        Ok(ImageRef { uri, digest })
    }
}

impl IdentityBackend for Simulated {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn create_role(&self, request: &RoleRequest) -> Result<RoleHandle> {
        request.check()?;
        let arn = format!(
            "arn:{}:iam::{}:role/{}",
            self.partition, self.account, request.name
        );
        log::debug!("simulated role {arn}");
        Ok(RoleHandle {
            arn,
            name: request.name.clone(),
        })
    }
}

impl RuntimeBackend for Simulated {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn create_runtime(&self, request: &RuntimeRequest) -> Result<RuntimeHandle> {
        let suffix = Self::short_id(&[
            request.name.as_str(),
            request.container_uri.as_str(),
            request.role_arn.as_str(),
        ]);
        let id = format!("{}-{suffix}", request.name);
        let arn = format!(
            "arn:{}:bedrock-agentcore:{}:{}:runtime/{id}",
            self.partition, self.region, self.account
        );
        log::debug!("simulated runtime {arn}");
        Ok(RuntimeHandle {
            arn,
            id,
            version: Some("1".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{Authorizer, NetworkMode, Protocol};
    use iamkit::{PermissionStatement, Principal};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn backend() -> Simulated {
        Simulated::new("ap-northeast-1", "123456789012")
    }

    #[test]
    fn test_build_uses_context_digest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        let request = BuildRequest {
            context_dir: temp.path().to_path_buf(),
            platform: "linux/arm64".to_string(),
            build_file: "Dockerfile".to_string(),
            repository: "voice-agent".to_string(),
            push: true,
        };

        let image = backend().build(&request).unwrap();
        assert_eq!(image.digest, context_digest(temp.path()).unwrap());
        assert!(image.uri.starts_with(
            "123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/voice-agent:"
        ));
    }

    #[test]
    fn test_build_missing_build_file() {
        let temp = TempDir::new().unwrap();
        let request = BuildRequest {
            context_dir: temp.path().to_path_buf(),
            platform: "linux/arm64".to_string(),
            build_file: "Dockerfile".to_string(),
            repository: "voice-agent".to_string(),
            push: false,
        };
        assert!(matches!(
            backend().build(&request),
            Err(Error::BuildFileNotFound(_))
        ));
    }

    #[test]
    fn test_role_arn() {
        let request = RoleRequest {
            name: "VoiceAgentRole".to_string(),
            principal: Principal::parse("bedrock-agentcore.amazonaws.com"),
            statements: vec![PermissionStatement::wildcard_allow()],
            policy_name: "VoiceAgentPolicy".to_string(),
            description: String::new(),
        };
        let role = backend().create_role(&request).unwrap();
        assert_eq!(role.arn, "arn:aws:iam::123456789012:role/VoiceAgentRole");
        assert_eq!(role.name, "VoiceAgentRole");
    }

    #[test]
    fn test_runtime_ids_stable() {
        let request = RuntimeRequest {
            name: "Itsuki_AgentCoreRuntime".to_string(),
            container_uri: "voice-agent:abc".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/VoiceAgentRole".to_string(),
            network_mode: NetworkMode::Public,
            protocol: Protocol::Http,
            environment: BTreeMap::new(),
            authorizer: Authorizer::None,
        };
        let first = backend().create_runtime(&request).unwrap();
        let second = backend().create_runtime(&request).unwrap();
        assert_eq!(first, second);
        assert!(first.id.starts_with("Itsuki_AgentCoreRuntime-"));
        assert!(first.arn.starts_with(
            "arn:aws:bedrock-agentcore:ap-northeast-1:123456789012:runtime/"
        ));
    }
}
