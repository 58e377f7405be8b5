//! Test doubles for graph and executor tests

use crate::context::ApplyContext;
use crate::error::ApplyError;
use crate::resource::{BoxedResource, Resource};
use crate::types::{NodeKind, Outputs, Properties};
use std::sync::{Arc, Mutex};

/// Shared record of node ids in the order their creation contract ran
pub type ApplyLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
pub struct StubResource {
    id: String,
    kind: NodeKind,
    properties: Properties,
    invalid: Option<ApplyError>,
    failure: Option<ApplyError>,
    log: Option<ApplyLog>,
}

impl StubResource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Image,
            properties: Properties::new(),
            invalid: None,
            failure: None,
            log: None,
        }
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn referencing(mut self, property: &str, node: &str, field: &str) -> Self {
        self.properties = self.properties.reference(property, node, field);
        self
    }

    pub fn literal(mut self, property: &str, value: &str) -> Self {
        self.properties = self.properties.literal(property, value);
        self
    }

    pub fn invalid(mut self, error: ApplyError) -> Self {
        self.invalid = Some(error);
        self
    }

    pub fn failing(mut self, error: ApplyError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn logged(mut self, log: &ApplyLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn boxed(self) -> BoxedResource {
        Box::new(self)
    }
}

impl Resource for StubResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn description(&self) -> String {
        format!("Stub resource {}", self.id)
    }

    fn properties(&self) -> Properties {
        self.properties.clone()
    }

    fn validate(&self) -> Result<(), ApplyError> {
        match &self.invalid {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.id.clone());
        }
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        // Every declared property must arrive resolved.
        for (name, _) in self.properties.iter() {
            ctx.properties.require(name)?;
        }
        Ok(Outputs::new()
            .with("arn", format!("arn:stub:{}", self.id))
            .with("id", self.id.clone()))
    }
}

pub fn new_log() -> ApplyLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn logged_ids(log: &ApplyLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
