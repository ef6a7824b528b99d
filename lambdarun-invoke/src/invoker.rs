//! Invocation entry point

use crate::args::build_args;
use crate::identity::{self, ContainerIdentity, DEFAULT_IDENTITY_FILE, DEFAULT_READER};
use crate::launcher::{ProcessHandle, ProcessLauncher, TokioLauncher};
use crate::options::{InvokeOptions, ResolvedOptions};
use crate::runner::run_to_completion;
use lambdarun_core::{InvocationId, InvokeError, RunResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

pub const DEFAULT_RUNTIME: &str = "docker";

/// Invoker configuration
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Container CLI, invoked as `<runtime> run ...`
    pub runtime: String,
    /// Program used to read the identity file
    pub reader: String,
    /// Pseudo-file naming the container this process runs in
    pub identity_file: PathBuf,
    /// Run nested inside the parent container's volumes and network
    pub nested: bool,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            reader: DEFAULT_READER.to_string(),
            identity_file: PathBuf::from(DEFAULT_IDENTITY_FILE),
            nested: false,
        }
    }
}

/// Nested mode from the value of the `DOCKER` environment variable.
/// Any non-empty value turns it on.
pub fn nested_from_env(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Runs Lambda handlers in a runtime container
pub struct Invoker {
    config: InvokerConfig,
    launcher: Arc<dyn ProcessLauncher>,
}

impl Invoker {
    /// Create an invoker that spawns real processes
    pub fn new(config: InvokerConfig) -> Self {
        Self::with_launcher(config, Arc::new(TokioLauncher))
    }

    pub fn with_launcher(config: InvokerConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Detect the container this process runs in
    pub async fn resolve_parent(&self) -> ContainerIdentity {
        identity::resolve_parent(
            self.launcher.as_ref(),
            &self.config.reader,
            &self.config.identity_file,
        )
        .await
    }

    /// Build the argument list and start the runtime without waiting on it
    pub fn start(
        &self,
        options: &ResolvedOptions,
        parent: Option<&str>,
    ) -> Result<Box<dyn ProcessHandle>, InvokeError> {
        info!("build arguments");
        let args = build_args(options, parent, self.config.nested);
        info!(runtime = %self.config.runtime, args = ?args, "args");

        self.launcher
            .spawn(&self.config.runtime, &args, &options.spawn_options)
    }

    /// Run one invocation to completion
    pub async fn invoke(&self, options: &InvokeOptions) -> Result<RunResult, InvokeError> {
        let invocation_id = InvocationId::new();
        let span = tracing::info_span!("invoke", invocation_id = %invocation_id);

        async move {
            let resolved = options.resolve_in_current_dir()?;

            let identity = if self.config.nested {
                info!("docker");
                let identity = self.resolve_parent().await;
                match &identity {
                    ContainerIdentity::Unresolved => {
                        warn!("Parent container unresolved, network will be `container:` with no id");
                    }
                    ContainerIdentity::Resolved(id) if id.is_empty() => {
                        warn!("No parent container found, network will be `container:` with no id");
                    }
                    ContainerIdentity::Resolved(_) => {}
                }
                identity
            } else {
                info!("not docker");
                ContainerIdentity::Resolved(String::new())
            };

            let handle = self.start(&resolved, identity.parent_id())?;
            let result = run_to_completion(handle, resolved.spawn_options.encoding).await;

            match &result {
                Ok(run) => debug!(code = run.code, "Invocation finished"),
                Err(e) => debug!(error = %e, "Invocation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
