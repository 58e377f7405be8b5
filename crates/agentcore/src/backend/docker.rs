//! Image builds through the `docker` CLI.

use crate::backend::aws::EcrRegistry;
use crate::backend::{ImageBuilder, is_installed, run_checked, run_with_stdin};
use crate::digest::context_digest;
use crate::error::{Error, Result};
use crate::types::{BuildRequest, ImageRef};

/// Builder that shells out to `docker build`.
///
/// Without a registry images are tagged `{repository}:{digest}` and stay
/// local unless pushed to a registry the daemon already knows about.
pub struct DockerCli {
    /// Path to the docker executable
    docker_path: String,
    /// Registry images are tagged into and pushed to
    registry: Option<EcrRegistry>,
}

impl DockerCli {
    /// Create a builder using `docker` from PATH.
    pub fn new() -> Self {
        Self::with_path("docker")
    }

    /// Create a builder using a specific executable.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            docker_path: path.into(),
            registry: None,
        }
    }

    /// Tag and push images into an ECR registry.
    pub fn with_registry(mut self, registry: EcrRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Image reference the build is tagged with.
    pub fn image_tag(&self, request: &BuildRequest, digest: &str) -> String {
        match &self.registry {
            Some(registry) => request.image_uri(&registry.host(), digest),
            None => request.tag_for(digest),
        }
    }

    fn login(&self, registry: &EcrRegistry) -> Result<()> {
        let host = registry.host();
        log::info!("logging in to {host}");
        let password = registry.login_password()?;
        run_with_stdin(&self.docker_path, &login_args(&host), &password, "login")?;
        Ok(())
    }

    /// Check the docker CLI is usable.
    pub fn ensure_available(&self) -> Result<()> {
        if is_installed(&self.docker_path) {
            Ok(())
        } else {
            Err(Error::CommandNotFound(self.docker_path.clone()))
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for `docker build`.
pub(crate) fn build_args(request: &BuildRequest, tag: &str) -> Vec<String> {
    vec![
        "build".to_string(),
        "--platform".to_string(),
        request.platform.clone(),
        "-f".to_string(),
        request.build_file_path().to_string_lossy().to_string(),
        "-t".to_string(),
        tag.to_string(),
        request.context_dir.to_string_lossy().to_string(),
    ]
}

/// Arguments for `docker login` with the password on stdin.
pub(crate) fn login_args(host: &str) -> Vec<String> {
    vec![
        "login".to_string(),
        "--username".to_string(),
        "AWS".to_string(),
        "--password-stdin".to_string(),
        host.to_string(),
    ]
}

impl ImageBuilder for DockerCli {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn build(&self, request: &BuildRequest) -> Result<ImageRef> {
        request.check_context()?;

        let digest = context_digest(&request.context_dir)?;
        let tag = self.image_tag(request, &digest);

        log::info!("building {tag} for {}", request.platform);
        run_checked(&self.docker_path, &build_args(request, &tag), "build")?;

        if request.push {
            if let Some(registry) = &self.registry {
                registry.ensure_repository(&request.repository)?;
                self.login(registry)?;
            }
            log::info!("pushing {tag}");
            run_checked(&self.docker_path, &["push".to_string(), tag.clone()], "push")?;
        } else if self.registry.is_some() {
            log::warn!("{tag} was not pushed; the runtime will not be able to pull it");
        }

        Ok(ImageRef { uri: tag, digest })
    }
}
