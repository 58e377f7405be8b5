//! Resources for the voice agent stack
//!
//! Each resource is a graph node that knows how to create one piece of
//! infrastructure through its backend:
//! - [`ImageResource`]: builds the container image
//! - [`RoleResource`]: creates the execution role and its inline policy
//! - [`RuntimeResource`]: creates the agent runtime bound to both

mod image;
mod role;
mod runtime;

pub use image::ImageResource;
pub use role::RoleResource;
pub use runtime::RuntimeResource;

use agentcore::{IdentityBackend, ImageBuilder, RuntimeBackend};
use declarative::ApplyError;
use std::sync::Arc;

/// Output field names
pub mod fields {
    pub const IMAGE_URI: &str = "imageUri";
    pub const DIGEST: &str = "digest";
    pub const ROLE_ARN: &str = "roleArn";
    pub const ROLE_NAME: &str = "roleName";
    pub const RUNTIME_ARN: &str = "agentRuntimeArn";
    pub const RUNTIME_ID: &str = "agentRuntimeId";
}

/// The backends a stack is provisioned through
#[derive(Clone)]
pub struct Backends {
    pub images: Arc<dyn ImageBuilder>,
    pub identity: Arc<dyn IdentityBackend>,
    pub runtime: Arc<dyn RuntimeBackend>,
}

impl Backends {
    /// Use one backend for everything
    pub fn uniform<B>(backend: B) -> Self
    where
        B: ImageBuilder + IdentityBackend + RuntimeBackend + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            images: backend.clone(),
            identity: backend.clone(),
            runtime: backend,
        }
    }

    /// Names of the backends, for display
    pub fn describe(&self) -> String {
        format!(
            "images={}, identity={}, runtime={}",
            self.images.name(),
            self.identity.name(),
            self.runtime.name()
        )
    }
}

/// Map a failed image build
fn build_error(err: agentcore::Error) -> ApplyError {
    ApplyError::Build(err.to_string())
}

/// Map a failed backend call; rejected requests are input problems
fn provisioning_error(err: agentcore::Error) -> ApplyError {
    match err {
        agentcore::Error::InvalidRequest(message) => ApplyError::Configuration(message),
        other => ApplyError::Provisioning(other.to_string()),
    }
}
