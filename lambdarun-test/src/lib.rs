//! Test utilities for lambdarun
//!
//! Provides a [`ScriptedLauncher`] that stands in for the real container CLI:
//! - Records every spawn (program, arguments, spawn options)
//! - Replays scripted stdout/stderr and exit codes per program
//! - Simulates programs that cannot be spawned
//!
//! and a [`LogCapture`] for asserting on the log events a run emits.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lambdarun_invoke::{Invoker, InvokerConfig, InvokeOptions};
//! use lambdarun_test::{Script, ScriptedLauncher};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_invoke() {
//!     let launcher = Arc::new(ScriptedLauncher::new());
//!     launcher.script("docker", Script::exit(0).stdout("{\"ok\":true}\n"));
//!
//!     let invoker = Invoker::with_launcher(InvokerConfig::default(), launcher.clone());
//!     let result = invoker.invoke(&InvokeOptions::new()).await.unwrap();
//!
//!     assert_eq!(result.stdout, "{\"ok\":true}\n");
//!     assert_eq!(launcher.spawns()[0].args[0], "run");
//! }
//! ```

pub mod launcher;
pub mod logs;

pub use launcher::{Script, ScriptedLauncher, SpawnRecord};
pub use logs::{CapturedEvent, LogCapture};

/// Install a test log subscriber; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::new("lambdarun=debug,lambdarun_invoke=debug"))
        .try_init();
}
