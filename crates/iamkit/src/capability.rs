//! Capability table and statement synthesis.
//!
//! Each capability maps to exactly one statement, scoped to the narrowest
//! resource pattern the service can express. Account-wide `*` resources
//! are used only where the action has no resource-level scoping
//! (token acquisition, metric publishing, tracing).

use crate::error::{Error, Result};
use crate::statement::PermissionStatement;
use std::fmt;
use std::str::FromStr;

/// Log group prefix the managed runtime writes under.
pub const RUNTIME_LOG_GROUP_PREFIX: &str = "/aws/bedrock-agentcore/runtimes";

/// CloudWatch namespace the runtime publishes metrics to.
pub const METRICS_NAMESPACE: &str = "bedrock-agentcore";

/// Partition, region and account interpolated into resource ARNs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// ARN partition, usually `aws`
    pub partition: String,
    /// Region name, e.g. `ap-northeast-1`
    pub region: String,
    /// 12-digit account id
    pub account: String,
}

impl Scope {
    /// Create a scope in the `aws` partition.
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            partition: "aws".to_string(),
            region: region.into(),
            account: account.into(),
        }
    }

    /// Override the partition (e.g. `aws-cn`).
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Check that every field is usable inside an ARN.
    pub fn validate(&self) -> Result<()> {
        if self.partition.is_empty() {
            return Err(Error::InvalidScope("partition is empty".to_string()));
        }
        if self.region.is_empty()
            || !self
                .region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::InvalidScope(format!(
                "region '{}' is not a region name",
                self.region
            )));
        }
        if self.account.len() != 12 || !self.account.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidScope(format!(
                "account '{}' is not a 12-digit account id",
                self.account
            )));
        }
        Ok(())
    }

    fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, service, self.region, self.account, resource
        )
    }
}

/// A permission the runtime needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Acquire a registry authorization token
    EcrToken,
    /// Pull image layers from the account's repositories
    EcrRead,
    /// Discover log groups
    LogsDescribe,
    /// Create and inspect the runtime's log groups
    LogsGroup,
    /// Write log events to the runtime's log streams
    LogsWrite,
    /// Publish metrics under the runtime namespace
    MetricsWrite,
    /// Emit trace segments and read sampling rules
    TraceWrite,
    /// Invoke foundation models
    ModelInvoke,
}

impl Capability {
    /// Every capability, in table order.
    pub const ALL: [Capability; 8] = [
        Capability::EcrToken,
        Capability::EcrRead,
        Capability::LogsDescribe,
        Capability::LogsGroup,
        Capability::LogsWrite,
        Capability::MetricsWrite,
        Capability::TraceWrite,
        Capability::ModelInvoke,
    ];

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::EcrToken => "ecr-token",
            Capability::EcrRead => "ecr-read",
            Capability::LogsDescribe => "logs-describe",
            Capability::LogsGroup => "logs-group",
            Capability::LogsWrite => "logs-write",
            Capability::MetricsWrite => "metrics-write",
            Capability::TraceWrite => "trace-write",
            Capability::ModelInvoke => "model-invoke",
        }
    }

    /// Statement id used for this capability's statement.
    pub fn sid(&self) -> &'static str {
        match self {
            Capability::EcrToken => "ECRTokenAccess",
            Capability::EcrRead => "ECRImageAccess",
            Capability::LogsDescribe => "LogGroupDiscovery",
            Capability::LogsGroup => "RuntimeLogGroups",
            Capability::LogsWrite => "RuntimeLogStreams",
            Capability::MetricsWrite => "RuntimeMetrics",
            Capability::TraceWrite => "RuntimeTracing",
            Capability::ModelInvoke => "BedrockModelInvocation",
        }
    }

    /// Build the statement for this capability within `scope`.
    pub fn statement(&self, scope: &Scope) -> Result<PermissionStatement> {
        let builder = PermissionStatement::allow().sid(self.sid());
        let builder = match self {
            Capability::EcrToken => builder.action("ecr:GetAuthorizationToken").resource("*"),
            Capability::EcrRead => builder
                .actions(["ecr:BatchGetImage", "ecr:GetDownloadUrlForLayer"])
                .resource(scope.arn("ecr", "repository/*")),
            Capability::LogsDescribe => builder
                .action("logs:DescribeLogGroups")
                .resource(scope.arn("logs", "log-group:*")),
            Capability::LogsGroup => builder
                .actions(["logs:DescribeLogStreams", "logs:CreateLogGroup"])
                .resource(scope.arn(
                    "logs",
                    &format!("log-group:{RUNTIME_LOG_GROUP_PREFIX}/*"),
                )),
            Capability::LogsWrite => builder
                .actions(["logs:CreateLogStream", "logs:PutLogEvents"])
                .resource(scope.arn(
                    "logs",
                    &format!("log-group:{RUNTIME_LOG_GROUP_PREFIX}/*:log-stream:*"),
                )),
            Capability::MetricsWrite => builder
                .action("cloudwatch:PutMetricData")
                .resource("*")
                .condition("StringEquals", "cloudwatch:namespace", METRICS_NAMESPACE),
            Capability::TraceWrite => builder
                .actions([
                    "xray:PutTraceSegments",
                    "xray:PutTelemetryRecords",
                    "xray:GetSamplingRules",
                    "xray:GetSamplingTargets",
                ])
                .resource("*"),
            Capability::ModelInvoke => builder
                .actions([
                    "bedrock:InvokeModel",
                    "bedrock:InvokeModelWithResponseStream",
                ])
                .resources([
                    format!("arn:{}:bedrock:*::foundation-model/*", scope.partition),
                    scope.arn("bedrock", "*"),
                ]),
        };
        builder.build()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| Error::UnknownCapability(s.to_string()))
    }
}

/// Synthesize one statement per capability.
///
/// Repeated capabilities produce a single statement. The result keeps the
/// request order so rendered documents are reproducible.
pub fn synthesize(capabilities: &[Capability], scope: &Scope) -> Result<Vec<PermissionStatement>> {
    scope.validate()?;

    let mut seen = Vec::with_capacity(capabilities.len());
    for capability in capabilities {
        if !seen.contains(capability) {
            seen.push(*capability);
        }
    }

    seen.iter().map(|c| c.statement(scope)).collect()
}

/// Synthesize statements from capability names.
///
/// Fails on the first unrecognized name, before any statement is built.
pub fn synthesize_named<S: AsRef<str>>(
    names: &[S],
    scope: &Scope,
) -> Result<Vec<PermissionStatement>> {
    let capabilities = names
        .iter()
        .map(|n| n.as_ref().parse())
        .collect::<Result<Vec<Capability>>>()?;
    synthesize(&capabilities, scope)
}
