//! Permission statements.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Whether a statement grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Effect {
    /// Grant the listed actions
    Allow,
    /// Deny the listed actions
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

/// Condition block: operator → condition key → expected value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, BTreeMap<String, String>>);

impl Condition {
    /// Look up the expected value for `operator` / `key`.
    pub fn get(&self, operator: &str, key: &str) -> Option<&str> {
        self.0
            .get(operator)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    /// Whether the condition has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One allow/deny rule over a set of actions and resource patterns.
///
/// Statements are immutable once built. Actions and resources are never
/// empty, and a bare `*` action only appears in
/// [`PermissionStatement::wildcard_allow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    effect: Effect,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<String>,
    #[serde(skip_serializing_if = "Condition::is_empty")]
    condition: Condition,
}

impl PermissionStatement {
    /// Start building an `Allow` statement.
    pub fn allow() -> StatementBuilder {
        StatementBuilder::new(Effect::Allow)
    }

    /// Start building a `Deny` statement.
    pub fn deny() -> StatementBuilder {
        StatementBuilder::new(Effect::Deny)
    }

    /// Allow every action on every resource.
    pub fn wildcard_allow() -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            actions: vec!["*".to_string()],
            resources: vec!["*".to_string()],
            condition: Condition::default(),
        }
    }

    /// Statement id.
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// Allow or deny.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Actions, in declaration order without duplicates.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Resource patterns, in declaration order without duplicates.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Condition block, possibly empty.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Whether this is the explicit allow-everything statement.
    pub fn is_wildcard(&self) -> bool {
        self.actions.iter().any(|a| a == "*")
    }

    /// Whether the statement applies to every resource in the account.
    pub fn is_account_wide(&self) -> bool {
        self.resources.iter().any(|r| r == "*")
    }
}

impl fmt::Display for PermissionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sid) = &self.sid {
            write!(f, "[{sid}] ")?;
        }
        write!(
            f,
            "{} {} on {}",
            self.effect,
            self.actions.join(", "),
            self.resources.join(", ")
        )
    }
}

/// Builder for [`PermissionStatement`].
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    sid: Option<String>,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<String>,
    condition: Condition,
}

impl StatementBuilder {
    fn new(effect: Effect) -> Self {
        Self {
            sid: None,
            effect,
            actions: Vec::new(),
            resources: Vec::new(),
            condition: Condition::default(),
        }
    }

    /// Set the statement id.
    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Add one action.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        push_unique(&mut self.actions, action.into());
        self
    }

    /// Add several actions.
    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for action in actions {
            push_unique(&mut self.actions, action.into());
        }
        self
    }

    /// Add one resource pattern.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        push_unique(&mut self.resources, resource.into());
        self
    }

    /// Add several resource patterns.
    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for resource in resources {
            push_unique(&mut self.resources, resource.into());
        }
        self
    }

    /// Add a condition entry, e.g. `StringEquals` / `cloudwatch:namespace`.
    pub fn condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.condition
            .0
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Validate and build the statement.
    pub fn build(self) -> Result<PermissionStatement> {
        if let Some(sid) = &self.sid
            && (sid.is_empty() || !sid.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(Error::InvalidSid(sid.clone()));
        }
        if self.actions.is_empty() {
            return Err(Error::EmptyActions { sid: self.sid });
        }
        if self.resources.is_empty() {
            return Err(Error::EmptyResources { sid: self.sid });
        }
        if self.actions.iter().any(|a| a == "*") {
            return Err(Error::UnscopedWildcard { sid: self.sid });
        }

        Ok(PermissionStatement {
            sid: self.sid,
            effect: self.effect,
            actions: self.actions,
            resources: self.resources,
            condition: self.condition,
        })
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_deduplicates() {
        let stmt = PermissionStatement::allow()
            .actions(["logs:PutLogEvents", "logs:PutLogEvents"])
            .resource("*")
            .resource("*")
            .build()
            .unwrap();
        assert_eq!(stmt.actions(), ["logs:PutLogEvents"]);
        assert_eq!(stmt.resources(), ["*"]);
    }

    #[test]
    fn test_empty_actions_rejected() {
        let err = PermissionStatement::allow()
            .sid("NoActions")
            .resource("*")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::EmptyActions { sid: Some(s) } if s == "NoActions"));
    }

    #[test]
    fn test_empty_resources_rejected() {
        let err = PermissionStatement::deny()
            .action("s3:GetObject")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResources { sid: None }));
    }

    #[test]
    fn test_star_action_only_via_wildcard() {
        let err = PermissionStatement::allow()
            .action("*")
            .resource("*")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnscopedWildcard { .. }));

        let wildcard = PermissionStatement::wildcard_allow();
        assert!(wildcard.is_wildcard());
        assert!(wildcard.is_account_wide());
    }

    #[test]
    fn test_invalid_sid_rejected() {
        let err = PermissionStatement::allow()
            .sid("ecr-token")
            .action("ecr:GetAuthorizationToken")
            .resource("*")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSid(_)));
    }

    #[test]
    fn test_serialize_iam_shape() {
        let stmt = PermissionStatement::allow()
            .sid("RuntimeMetrics")
            .action("cloudwatch:PutMetricData")
            .resource("*")
            .condition("StringEquals", "cloudwatch:namespace", "bedrock-agentcore")
            .build()
            .unwrap();

        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Sid": "RuntimeMetrics",
                "Effect": "Allow",
                "Action": ["cloudwatch:PutMetricData"],
                "Resource": ["*"],
                "Condition": {
                    "StringEquals": { "cloudwatch:namespace": "bedrock-agentcore" }
                }
            })
        );
    }

    #[test]
    fn test_serialize_omits_empty_parts() {
        let stmt = PermissionStatement::deny()
            .action("iam:PassRole")
            .resource("*")
            .build()
            .unwrap();
        let json = serde_json::to_value(&stmt).unwrap();
        assert!(json.get("Sid").is_none());
        assert!(json.get("Condition").is_none());
        assert_eq!(json["Effect"], "Deny");
    }
}
