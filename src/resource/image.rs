//! Container image resource

use super::{build_error, fields};
use agentcore::{BuildRequest, ImageBuilder};
use declarative::{ApplyContext, ApplyError, NodeKind, Outputs, Properties, Resource};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds the agent image from a local directory
pub struct ImageResource {
    id: String,
    request: BuildRequest,
    backend: Arc<dyn ImageBuilder>,
}

impl ImageResource {
    pub fn new(id: impl Into<String>, request: BuildRequest, backend: Arc<dyn ImageBuilder>) -> Self {
        Self {
            id: id.into(),
            request,
            backend,
        }
    }
}

impl fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResource")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Resource for ImageResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Image
    }

    fn description(&self) -> String {
        format!(
            "Build {} from {} ({})",
            self.request.repository,
            self.request.context_dir.display(),
            self.request.platform
        )
    }

    fn properties(&self) -> Properties {
        Properties::new()
            .literal("contextDir", self.request.context_dir.to_string_lossy())
            .literal("platform", &self.request.platform)
            .literal("buildFile", &self.request.build_file)
            .literal("repository", &self.request.repository)
            .literal("push", self.request.push.to_string())
    }

    fn validate(&self) -> Result<(), ApplyError> {
        if self.request.platform.trim().is_empty() {
            return Err(ApplyError::Configuration("platform is empty".to_string()));
        }
        if self.request.build_file.trim().is_empty() {
            return Err(ApplyError::Configuration("build file name is empty".to_string()));
        }
        if self.request.repository.trim().is_empty() {
            return Err(ApplyError::Configuration("repository is empty".to_string()));
        }
        Ok(())
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<Outputs, ApplyError> {
        let props = ctx.properties;
        let request = BuildRequest {
            context_dir: PathBuf::from(props.require("contextDir")?),
            platform: props.require("platform")?.to_string(),
            build_file: props.require("buildFile")?.to_string(),
            repository: props.require("repository")?.to_string(),
            push: props.get("push") == Some("true"),
        };

        let image = self.backend.build(&request).map_err(build_error)?;
        if ctx.verbose {
            log::info!("{} built as {}", ctx.node, image.uri);
        }

        Ok(Outputs::new()
            .with(fields::IMAGE_URI, image.uri)
            .with(fields::DIGEST, image.digest))
    }
}
