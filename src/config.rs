use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "voicestack.toml";

/// Runtime variable carrying the deploy region
const REGION_NAME: &str = "REGION_NAME";

/// Get the user-level config directory
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("voicestack"))
}

/// Expand `~` and environment variables in a path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Could not expand path '{path}'"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

// ============================================================================
// Stack Config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub stack: StackSection,
    pub image: ImageSection,
    pub identity: IdentitySection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSection {
    pub name: String,
    pub region: Option<String>,
    pub account: Option<String>,
    /// Where `deploy` writes its report
    pub report_file: String,
}

impl Default for StackSection {
    fn default() -> Self {
        Self {
            name: "VoiceAgentBackendStack".to_string(),
            region: None,
            account: None,
            report_file: "voicestack-outputs.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSection {
    pub id: String,
    /// Directory holding the build file
    pub source_dir: String,
    pub build_file: String,
    pub platform: String,
    pub repository: String,
    /// Push to the account's registry after building
    pub push: bool,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            id: "BackendAppAsset".to_string(),
            source_dir: "backend".to_string(),
            build_file: "Dockerfile".to_string(),
            platform: "linux/arm64".to_string(),
            repository: "voice-agent-backend".to_string(),
            push: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    pub id: String,
    /// Role name; defaults to `{stack}-{id}`
    pub role_name: Option<String>,
    pub principal: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            id: "AgentCoreRole".to_string(),
            role_name: None,
            principal: "bedrock-agentcore.amazonaws.com".to_string(),
            description: "IAM role for Bedrock AgentCore Runtime".to_string(),
            capabilities: iamkit::Capability::ALL
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub network_mode: String,
    pub model_id: String,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    pub channels: u32,
    /// Extra environment, merged over the generated variables
    pub environment: BTreeMap<String, String>,
    pub authorizer: Option<AuthorizerSection>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            id: "AgentCoreRuntime".to_string(),
            name: "Itsuki_AgentCoreRuntime".to_string(),
            protocol: "HTTP".to_string(),
            network_mode: "PUBLIC".to_string(),
            model_id: "amazon.nova-2-sonic-v1:0".to_string(),
            input_sample_rate: 16000,
            output_sample_rate: 16000,
            channels: 1,
            environment: BTreeMap::new(),
            authorizer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerSection {
    pub discovery_url: String,
    #[serde(default)]
    pub allowed_clients: Vec<String>,
}

impl RuntimeSection {
    /// Environment passed to the runtime container
    ///
    /// `REGION_NAME` always matches the deploy region; the role's policies
    /// are scoped to it.
    pub fn environment_for(&self, region: &str) -> Result<BTreeMap<String, String>> {
        if let Some(value) = self.environment.get(REGION_NAME)
            && value != region
        {
            bail!(
                "runtime.environment.{REGION_NAME} = '{value}' conflicts with the deploy region '{region}'"
            );
        }

        let mut env = BTreeMap::from([
            ("MODEL_ID".to_string(), self.model_id.clone()),
            (REGION_NAME.to_string(), region.to_string()),
            (
                "INPUT_SAMPLE_RATE".to_string(),
                self.input_sample_rate.to_string(),
            ),
            (
                "OUTPUT_SAMPLE_RATE".to_string(),
                self.output_sample_rate.to_string(),
            ),
            ("CHANNELS".to_string(), self.channels.to_string()),
        ]);
        env.extend(self.environment.clone());
        Ok(env)
    }
}

impl StackConfig {
    /// Load a config file, choosing the parser by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display())),
            Some("toml") | None => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display())),
            Some(other) => bail!("Unsupported config format '.{other}' (use .toml or .json)"),
        }
    }

    /// Load `path` if given, else `./voicestack.toml`, else the user config,
    /// else defaults
    pub fn discover(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = path {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Ok(dir) = config_dir() {
            candidates.push(dir.join(CONFIG_FILE));
        }

        for candidate in candidates {
            if candidate.is_file() {
                log::debug!("using config {}", candidate.display());
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }

        log::debug!("no config file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Resolve relative paths against the config file's directory
    pub fn source_dir(&self, config_path: Option<&Path>) -> Result<PathBuf> {
        let dir = expand_path(&self.image.source_dir)?;
        if dir.is_absolute() {
            return Ok(dir);
        }
        let base = config_path
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(base.join(dir))
    }

    /// Role name, derived from the stack name unless set
    pub fn role_name(&self) -> String {
        self.identity
            .role_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.stack.name, self.identity.id))
    }

    /// Inline policy name attached to the role
    pub fn policy_name(&self) -> String {
        format!("{}Policy", self.identity.id)
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_stack_constants() {
        let config = StackConfig::default();
        assert_eq!(config.runtime.model_id, "amazon.nova-2-sonic-v1:0");
        assert_eq!(config.runtime.input_sample_rate, 16000);
        assert_eq!(config.runtime.output_sample_rate, 16000);
        assert_eq!(config.runtime.channels, 1);
        assert_eq!(config.runtime.name, "Itsuki_AgentCoreRuntime");
        assert_eq!(config.image.platform, "linux/arm64");
        assert_eq!(config.image.build_file, "Dockerfile");
        assert_eq!(config.identity.principal, "bedrock-agentcore.amazonaws.com");
        assert_eq!(config.identity.capabilities.len(), 8);
        assert!(config.image.push);
    }

    #[test]
    fn test_environment_for_region() {
        let runtime = RuntimeSection::default();
        let env = runtime.environment_for("us-east-1").unwrap();
        assert_eq!(env["REGION_NAME"], "us-east-1");
        assert_eq!(env["MODEL_ID"], "amazon.nova-2-sonic-v1:0");
        assert_eq!(env["CHANNELS"], "1");
        assert_eq!(env.len(), 5);
    }

    #[test]
    fn test_environment_overrides() {
        let mut runtime = RuntimeSection::default();
        runtime
            .environment
            .insert("CHANNELS".to_string(), "2".to_string());
        runtime
            .environment
            .insert("LOG_LEVEL".to_string(), "debug".to_string());
        let env = runtime.environment_for("us-east-1").unwrap();
        assert_eq!(env["CHANNELS"], "2");
        assert_eq!(env["LOG_LEVEL"], "debug");
    }

    #[test]
    fn test_region_name_override_must_match_region() {
        let mut runtime = RuntimeSection::default();
        runtime
            .environment
            .insert("REGION_NAME".to_string(), "eu-west-1".to_string());
        let err = runtime.environment_for("us-east-1").unwrap_err();
        assert!(err.to_string().contains("REGION_NAME"));

        // Restating the deploy region is harmless
        assert_eq!(
            runtime.environment_for("eu-west-1").unwrap()["REGION_NAME"],
            "eu-west-1"
        );
    }

    #[test]
    fn test_load_partial_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("voicestack.toml");
        fs::write(
            &path,
            r#"
[stack]
name = "Demo"
region = "us-west-2"

[runtime]
channels = 2

[runtime.authorizer]
discovery_url = "https://idp.example.com/.well-known/openid-configuration"
allowed_clients = ["client-a"]
"#,
        )
        .unwrap();

        let config = StackConfig::load(&path).unwrap();
        assert_eq!(config.stack.name, "Demo");
        assert_eq!(config.stack.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.runtime.channels, 2);
        assert_eq!(config.runtime.model_id, "amazon.nova-2-sonic-v1:0");
        assert_eq!(
            config.runtime.authorizer.as_ref().unwrap().allowed_clients,
            vec!["client-a".to_string()]
        );
        assert_eq!(config.role_name(), "Demo-AgentCoreRole");
    }

    #[test]
    fn test_load_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stack.json");
        fs::write(&path, r#"{"identity": {"capabilities": ["ecr-token"]}}"#).unwrap();

        let config = StackConfig::load(&path).unwrap();
        assert_eq!(config.identity.capabilities, vec!["ecr-token".to_string()]);
        assert_eq!(config.identity.id, "AgentCoreRole");
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stack.yaml");
        fs::write(&path, "stack: {}").unwrap();
        assert!(StackConfig::load(&path).is_err());
    }

    #[test]
    fn test_source_dir_relative_to_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("voicestack.toml");
        let config = StackConfig::default();
        assert_eq!(
            config.source_dir(Some(&path)).unwrap(),
            temp.path().join("backend")
        );
        assert_eq!(config.source_dir(None).unwrap(), PathBuf::from("./backend"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = StackConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: StackConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.runtime.name, config.runtime.name);
        assert_eq!(parsed.identity.capabilities, config.identity.capabilities);
    }
}
