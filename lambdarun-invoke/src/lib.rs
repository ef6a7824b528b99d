//! Local Lambda invocation for lambdarun
//!
//! Runs a function handler inside a Lambda runtime container through an
//! external container CLI, optionally sharing the namespaces of the
//! container this process itself runs in.

pub mod args;
pub mod identity;
pub mod invoker;
pub mod launcher;
pub mod options;
pub mod runner;

pub use args::{build_args, PASSTHROUGH_ENV_VARS, TASK_MOUNT};
pub use identity::{short_container_id, ContainerIdentity, DEFAULT_IDENTITY_FILE};
pub use invoker::{nested_from_env, Invoker, InvokerConfig};
pub use launcher::{OutputReader, ProcessHandle, ProcessLauncher, TokioLauncher};
pub use options::{Encoding, InvokeOptions, ResolvedOptions, SpawnOptions};
pub use runner::run_to_completion;

pub use lambdarun_core::{InvocationId, InvokeError, RunResult};
