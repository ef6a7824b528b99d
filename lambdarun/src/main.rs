//! lambdarun - run Lambda handlers locally
//!
//! Invokes a handler inside a Lambda runtime container through the container
//! CLI. When `DOCKER` is set, the run shares the volumes and network of the
//! container lambdarun itself is running in.

mod config;

use anyhow::Context;
use clap::Parser;
use lambdarun_invoke::{
    nested_from_env, Encoding, InvokeError, InvokeOptions, Invoker, InvokerConfig, RunResult,
    SpawnOptions,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lambdarun")]
#[command(about = "Run a Lambda handler in a local runtime container", long_about = None)]
struct Args {
    /// Runtime image (default: lambci/lambda)
    #[arg(short, long, env = "LAMBDARUN_IMAGE")]
    image: Option<String>,

    /// Handler identifier (default: index.handler)
    #[arg(long, env = "LAMBDARUN_HANDLER")]
    handler: Option<String>,

    /// Event payload as JSON
    #[arg(short, long, conflicts_with = "event_file")]
    event: Option<String>,

    /// Read the event payload from a JSON file
    #[arg(long)]
    event_file: Option<PathBuf>,

    /// Directory mounted at /var/task (default: current directory)
    #[arg(long)]
    task_dir: Option<PathBuf>,

    /// Keep the container after it exits
    #[arg(long)]
    no_clean_up: bool,

    /// Forward AWS and Lambda variables from this environment
    #[arg(long)]
    add_env_vars: bool,

    /// Output encoding of the container CLI (utf8 or latin1)
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Container CLI to invoke
    #[arg(long)]
    runtime: Option<String>,

    /// Run nested in the parent container (also enabled by a non-empty DOCKER)
    #[arg(long)]
    nested: bool,

    /// File naming the container this process runs in
    #[arg(long)]
    identity_file: Option<PathBuf>,

    /// Configuration file (default: ./lambdarun.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the run result as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LAMBDARUN_LOG_LEVEL")]
    log_level: String,

    /// Extra arguments passed to `run` before the image
    #[arg(last = true)]
    docker_args: Vec<String>,
}

impl Args {
    /// Layer command-line flags over the configured options
    fn invoke_options(&self, settings: &config::Settings) -> anyhow::Result<InvokeOptions> {
        let mut options = settings.invoke_options();

        if let Some(image) = &self.image {
            options.docker_image = Some(image.clone());
        }
        if let Some(handler) = &self.handler {
            options.handler = Some(handler.clone());
        }
        if let Some(task_dir) = &self.task_dir {
            options.task_dir = Some(task_dir.clone());
        }
        if self.no_clean_up {
            options.clean_up = Some(false);
        }
        if self.add_env_vars {
            options.add_env_vars = Some(true);
        }
        if !self.docker_args.is_empty() {
            options.docker_args = Some(self.docker_args.clone());
        }
        if let Some(encoding) = self.encoding {
            let spawn_options = options.spawn_options.take().unwrap_or_default();
            options.spawn_options = Some(SpawnOptions {
                encoding,
                ..spawn_options
            });
        }

        match (&self.event, &self.event_file) {
            (Some(event), _) => options.with_event_json(event).context("parsing --event"),
            (None, Some(path)) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading event file {}", path.display()))?;
                options
                    .with_event_json(&raw)
                    .with_context(|| format!("parsing event file {}", path.display()))
            }
            (None, None) => Ok(options),
        }
    }

    fn invoker_config(&self, settings: &config::Settings) -> InvokerConfig {
        InvokerConfig {
            runtime: self.runtime.clone().unwrap_or_else(|| settings.runtime.clone()),
            reader: settings.reader.clone(),
            identity_file: self
                .identity_file
                .clone()
                .unwrap_or_else(|| settings.identity_file.clone()),
            nested: self.nested || nested_from_env(std::env::var("DOCKER").ok().as_deref()),
        }
    }
}

fn print_result(result: &RunResult, json: bool) {
    if json {
        println!("{}", result.to_json());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "lambdarun={level},lambdarun_invoke={level}",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = config::Settings::load(args.config.as_deref())?;
    let options = args.invoke_options(&settings)?;
    let invoker = Invoker::new(args.invoker_config(&settings));

    info!(
        runtime = %invoker.config().runtime,
        nested = invoker.config().nested,
        "Starting lambdarun"
    );

    match invoker.invoke(&options).await {
        Ok(result) => {
            print_result(&result, args.json);
            Ok(())
        }
        Err(InvokeError::NonZeroExit(result)) => {
            print_result(&result, args.json);
            std::process::exit(result.code);
        }
        Err(e) => {
            let code = e.exit_code();
            tracing::error!(error = %e, "Invocation failed");
            std::process::exit(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use clap::CommandFactory;
    use serde_json::json;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lambdarun").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            image: Some("from-config".to_string()),
            handler: Some("config.handler".to_string()),
            add_env_vars: Some(false),
            ..Settings::default()
        };
        let args = parse(&[
            "--image",
            "from-cli",
            "--add-env-vars",
            "--no-clean-up",
            "--event",
            r#"{"a":1}"#,
            "--",
            "--memory",
            "128m",
        ]);

        let options = args.invoke_options(&settings).unwrap();
        assert_eq!(options.docker_image.as_deref(), Some("from-cli"));
        assert_eq!(options.handler.as_deref(), Some("config.handler"));
        assert_eq!(options.add_env_vars, Some(true));
        assert_eq!(options.clean_up, Some(false));
        assert_eq!(options.event, Some(json!({"a": 1})));
        assert_eq!(
            options.docker_args,
            Some(vec!["--memory".to_string(), "128m".to_string()])
        );
    }

    #[test]
    fn test_event_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"Records": []}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = parse(&["--event-file", path.as_str()]);
        let options = args.invoke_options(&Settings::default()).unwrap();
        assert_eq!(options.event, Some(json!({"Records": []})));
    }

    #[test]
    fn test_encoding_flag() {
        let settings = Settings {
            encoding: Some(Encoding::Utf8),
            ..Settings::default()
        };
        let args = parse(&["--encoding", "latin1"]);
        let options = args.invoke_options(&settings).unwrap();
        assert_eq!(
            options.spawn_options.map(|s| s.encoding),
            Some(Encoding::Latin1)
        );

        assert!(Args::try_parse_from(["lambdarun", "--encoding", "hex"]).is_err());
    }

    #[test]
    fn test_invalid_event_is_error() {
        let args = parse(&["--event", "{not json"]);
        let error = args.invoke_options(&Settings::default()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<InvokeError>(),
            Some(InvokeError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_invoker_config_from_flags() {
        let args = parse(&["--runtime", "podman", "--nested", "--identity-file", "/tmp/cg"]);
        let config = args.invoker_config(&Settings::default());
        assert_eq!(config.runtime, "podman");
        assert_eq!(config.reader, "cat");
        assert_eq!(config.identity_file, PathBuf::from("/tmp/cg"));
        assert!(config.nested);
    }
}
