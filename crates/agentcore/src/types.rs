//! Request and handle types shared by all backends.

use crate::error::{Error, Result};
use iamkit::{PermissionStatement, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Everything needed to build (and optionally push) a container image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Directory sent to the builder as build context
    pub context_dir: PathBuf,
    /// Target platform, e.g. `linux/arm64`
    pub platform: String,
    /// Build file name, relative to the context directory
    pub build_file: String,
    /// Repository the image is tagged into
    pub repository: String,
    /// Push the image after building
    pub push: bool,
}

impl BuildRequest {
    /// Path to the build file inside the context.
    pub fn build_file_path(&self) -> PathBuf {
        self.context_dir.join(&self.build_file)
    }

    /// Check the context directory and build file exist.
    pub fn check_context(&self) -> Result<()> {
        if !self.context_dir.is_dir() {
            return Err(Error::ContextNotFound(self.context_dir.clone()));
        }
        let build_file = self.build_file_path();
        if !build_file.is_file() {
            return Err(Error::BuildFileNotFound(build_file));
        }
        Ok(())
    }

    /// Image tag for a given content digest.
    pub fn tag_for(&self, digest: &str) -> String {
        let short = &digest[..digest.len().min(16)];
        format!("{}:{}", self.repository, short)
    }

    /// Fully qualified image reference inside `registry`.
    pub fn image_uri(&self, registry: &str, digest: &str) -> String {
        format!("{registry}/{}", self.tag_for(digest))
    }
}

/// Private ECR registry host for an account and region.
pub fn ecr_registry(account: &str, region: &str) -> String {
    format!("{account}.dkr.ecr.{region}.amazonaws.com")
}

/// A built image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Pullable image reference
    pub uri: String,
    /// Content digest of the build context
    pub digest: String,
}

/// A role to create with its trust and inline identity policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    /// Role name
    pub name: String,
    /// Principal allowed to assume the role
    pub principal: Principal,
    /// Inline policy statements
    pub statements: Vec<PermissionStatement>,
    /// Name of the inline policy
    pub policy_name: String,
    /// Human-readable description
    pub description: String,
}

impl RoleRequest {
    /// Reject requests that would create a role granting nothing.
    pub fn check(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > 64 {
            return Err(Error::InvalidRequest(format!(
                "role name must be 1-64 characters: '{}'",
                self.name
            )));
        }
        if self.statements.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "role '{}' has no permission statements",
                self.name
            )));
        }
        Ok(())
    }
}

/// A created role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHandle {
    /// Role ARN
    pub arn: String,
    /// Role name
    pub name: String,
}

/// Network placement of a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkMode {
    /// Publicly reachable endpoint
    #[default]
    Public,
}

impl NetworkMode {
    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Public => "PUBLIC",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(NetworkMode::Public),
            _ => Err(Error::InvalidRequest(format!("unknown network mode: {s}"))),
        }
    }
}

/// Protocol the runtime container speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Plain HTTP (including WebSocket upgrades)
    #[default]
    Http,
    /// Model Context Protocol
    Mcp,
    /// Agent-to-agent protocol
    A2a,
}

impl Protocol {
    /// Wire name of the protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Mcp => "MCP",
            Protocol::A2a => "A2A",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(Protocol::Http),
            "MCP" => Ok(Protocol::Mcp),
            "A2A" => Ok(Protocol::A2a),
            _ => Err(Error::InvalidRequest(format!("unknown protocol: {s}"))),
        }
    }
}

/// Inbound authorization for a runtime endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authorizer {
    /// IAM (SigV4) authorization only
    #[default]
    None,
    /// JWT bearer tokens checked against an OIDC discovery document
    CustomJwt {
        /// OIDC discovery URL
        discovery_url: String,
        /// Client ids accepted in the token
        allowed_clients: Vec<String>,
    },
}

impl Authorizer {
    /// Render the authorizer configuration, if any.
    pub fn to_value(&self) -> Option<serde_json::Value> {
        match self {
            Authorizer::None => None,
            Authorizer::CustomJwt {
                discovery_url,
                allowed_clients,
            } => Some(serde_json::json!({
                "customJWTAuthorizer": {
                    "discoveryUrl": discovery_url,
                    "allowedClients": allowed_clients,
                }
            })),
        }
    }
}

/// A runtime to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequest {
    /// Runtime name
    pub name: String,
    /// Image the runtime runs
    pub container_uri: String,
    /// Role the runtime assumes
    pub role_arn: String,
    /// Network placement
    pub network_mode: NetworkMode,
    /// Protocol the container speaks
    pub protocol: Protocol,
    /// Environment passed to the container
    pub environment: BTreeMap<String, String>,
    /// Inbound authorization
    pub authorizer: Authorizer,
}

/// A created runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeHandle {
    /// Runtime ARN
    pub arn: String,
    /// Runtime id
    pub id: String,
    /// Version reported by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn build_request(dir: &Path) -> BuildRequest {
        BuildRequest {
            context_dir: dir.to_path_buf(),
            platform: "linux/arm64".to_string(),
            build_file: "Dockerfile".to_string(),
            repository: "voice-agent".to_string(),
            push: false,
        }
    }

    #[test]
    fn test_check_context_missing_dir() {
        let temp = TempDir::new().unwrap();
        let req = build_request(&temp.path().join("missing"));
        assert!(matches!(req.check_context(), Err(Error::ContextNotFound(_))));
    }

    #[test]
    fn test_check_context_missing_build_file() {
        let temp = TempDir::new().unwrap();
        let req = build_request(temp.path());
        assert!(matches!(
            req.check_context(),
            Err(Error::BuildFileNotFound(_))
        ));

        std::fs::write(temp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        assert!(req.check_context().is_ok());
    }

    #[test]
    fn test_tag_for_shortens_digest() {
        let temp = TempDir::new().unwrap();
        let req = build_request(temp.path());
        assert_eq!(
            req.tag_for("0123456789abcdef0123456789abcdef"),
            "voice-agent:0123456789abcdef"
        );
        assert_eq!(req.tag_for("abc"), "voice-agent:abc");
    }

    #[test]
    fn test_image_uri_in_ecr_registry() {
        let temp = TempDir::new().unwrap();
        let req = build_request(temp.path());
        let registry = ecr_registry("123456789012", "us-east-1");
        assert_eq!(registry, "123456789012.dkr.ecr.us-east-1.amazonaws.com");
        assert_eq!(
            req.image_uri(&registry, "0123456789abcdef0123"),
            "123456789012.dkr.ecr.us-east-1.amazonaws.com/voice-agent:0123456789abcdef"
        );
    }

    #[test]
    fn test_role_request_check() {
        let mut req = RoleRequest {
            name: "VoiceAgentRole".to_string(),
            principal: Principal::parse("bedrock-agentcore.amazonaws.com"),
            statements: Vec::new(),
            policy_name: "VoiceAgentPolicy".to_string(),
            description: String::new(),
        };
        assert!(matches!(req.check(), Err(Error::InvalidRequest(_))));

        req.statements.push(PermissionStatement::wildcard_allow());
        assert!(req.check().is_ok());

        req.name = "x".repeat(65);
        assert!(req.check().is_err());
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("A2A".parse::<Protocol>().unwrap(), Protocol::A2a);
        assert!("grpc".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Mcp.to_string(), "MCP");
    }

    #[test]
    fn test_authorizer_value() {
        assert!(Authorizer::None.to_value().is_none());
        let jwt = Authorizer::CustomJwt {
            discovery_url: "https://idp.example.com/.well-known/openid-configuration".into(),
            allowed_clients: vec!["client-a".into()],
        };
        let value = jwt.to_value().unwrap();
        assert_eq!(
            value["customJWTAuthorizer"]["allowedClients"][0],
            "client-a"
        );
    }
}
