//! Parent container detection
//!
//! When this process runs inside a container, the init process's cpuset
//! path ends with the container id. The short form of that id is what the
//! container CLI accepts for `--volumes-from` and `--network container:`.

use crate::launcher::{OutputReader, ProcessLauncher};
use crate::options::SpawnOptions;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

pub const DEFAULT_IDENTITY_FILE: &str = "/proc/1/cpuset";
pub const DEFAULT_READER: &str = "cat";

/// Length of a short container id
pub const SHORT_ID_LEN: usize = 12;

/// Outcome of parent container detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerIdentity {
    /// Identity source was read. An empty id means the cgroup path carried
    /// no container component, as on a bare host (`/`).
    Resolved(String),
    /// Identity source could not be read at all
    Unresolved,
}

impl ContainerIdentity {
    /// Parent container id, if one was found
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Resolved(id) if !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

/// Derive the short container id from raw identity file content.
///
/// `/docker/abcdef0123456789.scope` becomes `abcdef012345`.
pub fn short_container_id(raw: &str) -> String {
    let raw = raw.trim_end();
    let base = raw.rsplit('/').next().unwrap_or(raw);
    let base = match base.rfind('.') {
        Some(idx) => &base[..idx],
        None => base,
    };
    base.chars().take(SHORT_ID_LEN).collect()
}

/// Read the identity file with `reader` and derive the parent container id.
///
/// Never fails: a reader that cannot be spawned or produces no output
/// yields [`ContainerIdentity::Unresolved`]. The reader's exit code is not
/// consulted.
pub async fn resolve_parent(
    launcher: &dyn ProcessLauncher,
    reader: &str,
    identity_file: &Path,
) -> ContainerIdentity {
    info!("get container id");

    let args = vec![identity_file.display().to_string()];
    let mut handle = match launcher.spawn(reader, &args, &SpawnOptions::default()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Could not read container identity");
            return ContainerIdentity::Unresolved;
        }
    };

    let (stdout, stderr) = tokio::join!(
        read_all(handle.take_stdout()),
        read_all(handle.take_stderr())
    );
    if !stderr.trim().is_empty() {
        debug!(stderr = %stderr.trim_end(), "Identity reader stderr");
    }
    if let Err(e) = handle.wait().await {
        debug!(error = %e, "Identity reader did not exit cleanly");
    }

    if stdout.trim().is_empty() {
        warn!(path = %identity_file.display(), "Container identity file was empty or unreadable");
        return ContainerIdentity::Unresolved;
    }

    let container_id = short_container_id(&stdout);
    info!(container_id = %container_id, "container_id: {}", container_id);
    ContainerIdentity::Resolved(container_id)
}

async fn read_all(reader: Option<OutputReader>) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        debug!(error = %e, "Failed reading identity reader output");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
