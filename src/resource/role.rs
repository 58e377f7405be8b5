//! Execution role resource

use super::{fields, provisioning_error};
use agentcore::{IdentityBackend, RoleRequest};
use declarative::{ApplyContext, ApplyError, NodeKind, Outputs, Properties, Resource};
use iamkit::{PermissionStatement, Principal};
use std::fmt;
use std::sync::Arc;

/// IAM role names are at most 64 characters
const MAX_ROLE_NAME: usize = 64;

/// Creates the runtime's execution role and attaches its statements
pub struct RoleResource {
    id: String,
    role_name: String,
    policy_name: String,
    description: String,
    principal: Principal,
    statements: Vec<PermissionStatement>,
    backend: Arc<dyn IdentityBackend>,
}

impl RoleResource {
    pub fn new(
        id: impl Into<String>,
        role_name: impl Into<String>,
        principal: Principal,
        statements: Vec<PermissionStatement>,
        backend: Arc<dyn IdentityBackend>,
    ) -> Self {
        let id = id.into();
        Self {
            policy_name: format!("{id}Policy"),
            id,
            role_name: role_name.into(),
            description: String::new(),
            principal,
            statements,
            backend,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_policy_name(mut self, policy_name: impl Into<String>) -> Self {
        self.policy_name = policy_name.into();
        self
    }

    fn check_statements(&self) -> Result<(), ApplyError> {
        if self.statements.is_empty() {
            return Err(ApplyError::Configuration(format!(
                "role '{}' has no permission statements",
                self.role_name
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for RoleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleResource")
            .field("id", &self.id)
            .field("role_name", &self.role_name)
            .field("principal", &self.principal)
            .field("statements", &self.statements.len())
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Resource for RoleResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Identity
    }

    fn description(&self) -> String {
        format!(
            "Create role {} trusted by {} with {} statements",
            self.role_name,
            self.principal,
            self.statements.len()
        )
    }

    fn properties(&self) -> Properties {
        Properties::new()
            .literal("roleName", &self.role_name)
            .literal("policyName", &self.policy_name)
            .literal("principal", self.principal.to_string())
    }

    fn validate(&self) -> Result<(), ApplyError> {
        if self.role_name.is_empty() || self.role_name.len() > MAX_ROLE_NAME {
            return Err(ApplyError::Configuration(format!(
                "role name must be 1-{MAX_ROLE_NAME} characters: '{}'",
                self.role_name
            )));
        }
        self.check_statements()
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError> {
        self.check_statements()?;

        let request = RoleRequest {
            name: ctx.properties.require("roleName")?.to_string(),
            principal: self.principal.clone(),
            statements: self.statements.clone(),
            policy_name: ctx.properties.require("policyName")?.to_string(),
            description: self.description.clone(),
        };

        let role = self
            .backend
            .create_role(&request)
            .map_err(provisioning_error)?;
        if ctx.verbose {
            for statement in &self.statements {
                log::info!("{}: {}", ctx.node, statement);
            }
        }

        Ok(Outputs::new()
            .with(fields::ROLE_ARN, role.arn)
            .with(fields::ROLE_NAME, role.name))
    }
}
