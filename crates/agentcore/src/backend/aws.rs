//! Provisioning through the `aws` CLI.

use crate::backend::{IdentityBackend, RuntimeBackend, is_installed, run_checked};
use crate::error::{Error, Result};
use crate::types::{RoleHandle, RoleRequest, RuntimeHandle, RuntimeRequest, ecr_registry};
use iamkit::{PolicyDocument, TrustPolicy};
use serde::Deserialize;
use serde_json::json;

/// Backend that executes `aws` commands.
#[derive(Debug, Clone)]
pub struct AwsCli {
    aws_path: String,
    region: String,
    profile: Option<String>,
}

impl AwsCli {
    /// Create a backend for `region` using `aws` from PATH.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            aws_path: "aws".to_string(),
            region: region.into(),
            profile: None,
        }
    }

    /// Use a named CLI profile.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Use a specific executable.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.aws_path = path.into();
        self
    }

    /// The target region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Check the aws CLI is usable.
    pub fn ensure_available(&self) -> Result<()> {
        if is_installed(&self.aws_path) {
            Ok(())
        } else {
            Err(Error::CommandNotFound(self.aws_path.clone()))
        }
    }

    /// Account id of the calling credentials.
    pub fn caller_account(&self) -> Result<String> {
        let stdout = self.run(vec!["sts".into(), "get-caller-identity".into()], "sts get-caller-identity")?;
        let identity: CallerIdentity = serde_json::from_str(&stdout)?;
        Ok(identity.account)
    }

    fn run(&self, mut args: Vec<String>, action: &str) -> Result<String> {
        args.extend(["--region".to_string(), self.region.clone()]);
        args.extend(["--output".to_string(), "json".to_string()]);
        if let Some(profile) = &self.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
        run_checked(&self.aws_path, &args, action)
    }
}

/// The account's private ECR registry, used as the push target for images.
#[derive(Debug, Clone)]
pub struct EcrRegistry {
    aws: AwsCli,
    account: String,
}

impl EcrRegistry {
    /// Registry of `account` in the CLI's region.
    pub fn new(aws: AwsCli, account: impl Into<String>) -> Self {
        Self {
            aws,
            account: account.into(),
        }
    }

    /// Registry host, `{account}.dkr.ecr.{region}.amazonaws.com`.
    pub fn host(&self) -> String {
        ecr_registry(&self.account, self.aws.region())
    }

    /// Create `repository` unless it already exists.
    pub fn ensure_repository(&self, repository: &str) -> Result<()> {
        let describe = vec![
            "ecr".to_string(),
            "describe-repositories".to_string(),
            "--repository-names".to_string(),
            repository.to_string(),
        ];
        match self.aws.run(describe, "ecr describe-repositories") {
            Ok(_) => Ok(()),
            Err(Error::CommandFailed { stderr, .. })
                if stderr.contains("RepositoryNotFoundException") =>
            {
                log::info!("creating repository {repository}");
                self.aws
                    .run(create_repository_args(repository), "ecr create-repository")
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    /// Short-lived password for `docker login`.
    pub fn login_password(&self) -> Result<String> {
        let stdout = self.aws.run(
            vec!["ecr".to_string(), "get-login-password".to_string()],
            "ecr get-login-password",
        )?;
        Ok(stdout.trim().to_string())
    }
}

/// Arguments for `aws ecr create-repository`.
pub(crate) fn create_repository_args(repository: &str) -> Vec<String> {
    vec![
        "ecr".to_string(),
        "create-repository".to_string(),
        "--repository-name".to_string(),
        repository.to_string(),
        "--image-scanning-configuration".to_string(),
        "scanOnPush=true".to_string(),
    ]
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateRoleResponse {
    role: RoleInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleInfo {
    arn: String,
    role_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRuntimeResponse {
    agent_runtime_arn: String,
    agent_runtime_id: String,
    #[serde(default)]
    agent_runtime_version: Option<String>,
}

/// Arguments for `aws iam create-role`.
pub(crate) fn create_role_args(request: &RoleRequest) -> Vec<String> {
    let trust = TrustPolicy::new(request.principal.clone());
    let mut args = vec![
        "iam".to_string(),
        "create-role".to_string(),
        "--role-name".to_string(),
        request.name.clone(),
        "--assume-role-policy-document".to_string(),
        trust.to_json(),
    ];
    if !request.description.is_empty() {
        args.extend(["--description".to_string(), request.description.clone()]);
    }
    args
}

/// Arguments for `aws iam put-role-policy`.
pub(crate) fn put_role_policy_args(request: &RoleRequest) -> Result<Vec<String>> {
    let document = PolicyDocument::new(request.statements.clone());
    Ok(vec![
        "iam".to_string(),
        "put-role-policy".to_string(),
        "--role-name".to_string(),
        request.name.clone(),
        "--policy-name".to_string(),
        request.policy_name.clone(),
        "--policy-document".to_string(),
        document.to_json()?,
    ])
}

/// Arguments for `aws bedrock-agentcore-control create-agent-runtime`.
pub(crate) fn create_runtime_args(request: &RuntimeRequest) -> Vec<String> {
    let artifact = json!({
        "containerConfiguration": { "containerUri": request.container_uri }
    });
    let network = json!({ "networkMode": request.network_mode.as_str() });
    let protocol = json!({ "serverProtocol": request.protocol.as_str() });

    let mut args = vec![
        "bedrock-agentcore-control".to_string(),
        "create-agent-runtime".to_string(),
        "--agent-runtime-name".to_string(),
        request.name.clone(),
        "--agent-runtime-artifact".to_string(),
        artifact.to_string(),
        "--role-arn".to_string(),
        request.role_arn.clone(),
        "--network-configuration".to_string(),
        network.to_string(),
        "--protocol-configuration".to_string(),
        protocol.to_string(),
    ];
    if !request.environment.is_empty() {
        args.extend([
            "--environment-variables".to_string(),
            json!(request.environment).to_string(),
        ]);
    }
    if let Some(authorizer) = request.authorizer.to_value() {
        args.extend([
            "--authorizer-configuration".to_string(),
            authorizer.to_string(),
        ]);
    }
    args
}

impl IdentityBackend for AwsCli {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn create_role(&self, request: &RoleRequest) -> Result<RoleHandle> {
        request.check()?;

        log::info!("creating role {}", request.name);
        let stdout = self.run(create_role_args(request), "iam create-role")?;
        let response: CreateRoleResponse = serde_json::from_str(&stdout)
            .map_err(|e| Error::InvalidResponse(format!("iam create-role: {e}")))?;

        log::info!(
            "attaching {} statements to {}",
            request.statements.len(),
            request.name
        );
        self.run(put_role_policy_args(request)?, "iam put-role-policy")?;

        Ok(RoleHandle {
            arn: response.role.arn,
            name: response.role.role_name,
        })
    }
}

impl RuntimeBackend for AwsCli {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn create_runtime(&self, request: &RuntimeRequest) -> Result<RuntimeHandle> {
        log::info!("creating agent runtime {}", request.name);
        let stdout = self.run(create_runtime_args(request), "create-agent-runtime")?;
        let response: CreateRuntimeResponse = serde_json::from_str(&stdout)
            .map_err(|e| Error::InvalidResponse(format!("create-agent-runtime: {e}")))?;

        Ok(RuntimeHandle {
            arn: response.agent_runtime_arn,
            id: response.agent_runtime_id,
            version: response.agent_runtime_version,
        })
    }
}
