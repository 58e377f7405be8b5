//! Resolution table - write-once store of applied node outputs

use crate::error::{ApplyError, Error, Result};
use crate::types::{Outputs, Properties, PropertyValue, ResolvedProperties};
use std::collections::HashMap;

/// Resolved values keyed by (node id, field name)
///
/// Append-only: a key is written once, when its node reaches `Applied`,
/// and never overwritten.
#[derive(Debug, Default)]
pub struct ResolutionTable {
    values: HashMap<(String, String), String>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single resolved value
    pub fn insert(&mut self, node: &str, field: &str, value: String) -> Result<()> {
        let key = (node.to_string(), field.to_string());
        if self.values.contains_key(&key) {
            return Err(Error::Overwrite {
                node: key.0,
                field: key.1,
            });
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Record every output of an applied node
    pub fn record(&mut self, node: &str, outputs: Outputs) -> Result<()> {
        for (field, value) in outputs {
            self.insert(node, &field, value)?;
        }
        Ok(())
    }

    pub fn get(&self, node: &str, field: &str) -> Option<&str> {
        self.values
            .get(&(node.to_string(), field.to_string()))
            .map(String::as_str)
    }

    /// Substitute every reference in `properties`
    ///
    /// Fails with a provisioning error if a referenced value is absent,
    /// which only happens if a predecessor was not applied first.
    pub fn resolve(&self, properties: &Properties) -> std::result::Result<ResolvedProperties, ApplyError> {
        let mut resolved = ResolvedProperties::new();
        for (name, value) in properties.iter() {
            let concrete = match value {
                PropertyValue::Literal(v) => v.clone(),
                PropertyValue::Ref(r) => self
                    .get(&r.node, &r.field)
                    .ok_or_else(|| {
                        ApplyError::Provisioning(format!(
                            "property '{name}' references {r}, which has not been applied"
                        ))
                    })?
                    .to_string(),
            };
            resolved.insert(name.clone(), concrete);
        }
        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
