//! Policy documents and trust policies.

use crate::error::Result;
use crate::statement::PermissionStatement;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// An identity policy: a list of statements evaluated as a union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    version: &'static str,
    #[serde(rename = "Statement")]
    statements: Vec<PermissionStatement>,
}

impl PolicyDocument {
    /// Create a document from statements, keeping their order.
    pub fn new(statements: Vec<PermissionStatement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statements,
        }
    }

    /// Statements in attachment order.
    pub fn statements(&self) -> &[PermissionStatement] {
        &self.statements
    }

    /// Whether the document grants nothing.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Who may assume an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A service principal, e.g. `bedrock-agentcore.amazonaws.com`
    Service(String),
    /// Another account, by 12-digit id
    Account(String),
}

impl Principal {
    /// Parse a principal descriptor: a 12-digit id is an account,
    /// anything else a service.
    pub fn parse(descriptor: &str) -> Self {
        let descriptor = descriptor.trim();
        if descriptor.len() == 12 && descriptor.chars().all(|c| c.is_ascii_digit()) {
            Principal::Account(descriptor.to_string())
        } else {
            Principal::Service(descriptor.to_string())
        }
    }

    fn to_value(&self, partition: &str) -> serde_json::Value {
        match self {
            Principal::Service(service) => json!({ "Service": service }),
            Principal::Account(id) => json!({ "AWS": format!("arn:{partition}:iam::{id}:root") }),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Service(service) => write!(f, "{service}"),
            Principal::Account(id) => write!(f, "account {id}"),
        }
    }
}

/// Assume-role policy allowing one principal to assume the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    principal: Principal,
    partition: String,
}

impl TrustPolicy {
    /// Trust `principal` in the `aws` partition.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            partition: "aws".to_string(),
        }
    }

    /// Override the partition used for account principals.
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// The trusted principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": self.principal.to_value(&self.partition),
                    "Action": "sts:AssumeRole"
                }
            ]
        })
    }

    /// Render as compact JSON.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
