//! # agentcore
//!
//! Backends that build agent images and provision agent runtimes.
//!
//! This crate provides functionality for:
//! - Hashing a build context into a stable content digest
//! - Building images through the `docker` CLI and pushing them to ECR
//! - Creating roles and runtimes through the `aws` CLI
//! - A deterministic simulated backend for offline runs
//!
//! ## Example
//!
//! ```no_run
//! use agentcore::{BuildRequest, ImageBuilder, Simulated};
//!
//! let backend = Simulated::new("us-east-1", "123456789012");
//! let image = backend.build(&BuildRequest {
//!     context_dir: "backend".into(),
//!     platform: "linux/arm64".into(),
//!     build_file: "Dockerfile".into(),
//!     repository: "voice-agent".into(),
//!     push: false,
//! })?;
//! println!("{}", image.uri);
//! # Ok::<(), agentcore::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod digest;
pub mod error;
pub mod types;

pub use backend::aws::{AwsCli, EcrRegistry};
pub use backend::docker::DockerCli;
pub use backend::simulated::Simulated;
pub use backend::{IdentityBackend, ImageBuilder, RuntimeBackend};
pub use digest::context_digest;
pub use error::{Error, Result};
pub use types::{
    Authorizer, BuildRequest, ImageRef, NetworkMode, Protocol, RoleHandle, RoleRequest,
    RuntimeHandle, RuntimeRequest, ecr_registry,
};
