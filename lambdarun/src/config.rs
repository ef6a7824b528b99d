//! Configuration management

use lambdarun_invoke::identity::{DEFAULT_IDENTITY_FILE, DEFAULT_READER};
use lambdarun_invoke::invoker::DEFAULT_RUNTIME;
use lambdarun_invoke::{Encoding, InvokeOptions, SpawnOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from `lambdarun.toml` and `LAMBDARUN_*` variables
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_runtime")]
    pub runtime: String,

    #[serde(default = "default_reader")]
    pub reader: String,

    #[serde(default = "default_identity_file")]
    pub identity_file: PathBuf,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub handler: Option<String>,

    #[serde(default)]
    pub task_dir: Option<PathBuf>,

    #[serde(default)]
    pub clean_up: Option<bool>,

    #[serde(default)]
    pub add_env_vars: Option<bool>,

    #[serde(default)]
    pub docker_args: Vec<String>,

    #[serde(default)]
    pub encoding: Option<Encoding>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            reader: default_reader(),
            identity_file: default_identity_file(),
            image: None,
            handler: None,
            task_dir: None,
            clean_up: None,
            add_env_vars: None,
            docker_args: Vec::new(),
            encoding: None,
        }
    }
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_reader() -> String {
    DEFAULT_READER.to_string()
}

fn default_identity_file() -> PathBuf {
    PathBuf::from(DEFAULT_IDENTITY_FILE)
}

impl Settings {
    /// Load configuration from file and environment.
    ///
    /// With no explicit path, `lambdarun.toml` in the working directory is
    /// read if present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("lambdarun").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LAMBDARUN")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("docker_args"),
            )
            .build()?;

        Ok(config.try_deserialize::<Settings>()?)
    }

    /// Invocation options seeded from these settings
    pub fn invoke_options(&self) -> InvokeOptions {
        InvokeOptions {
            docker_image: self.image.clone(),
            handler: self.handler.clone(),
            event: None,
            task_dir: self.task_dir.clone(),
            clean_up: self.clean_up,
            add_env_vars: self.add_env_vars,
            docker_args: if self.docker_args.is_empty() {
                None
            } else {
                Some(self.docker_args.clone())
            },
            spawn_options: self.encoding.map(|encoding| SpawnOptions {
                encoding,
                ..SpawnOptions::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.runtime, "docker");
        assert_eq!(settings.reader, "cat");
        assert_eq!(settings.identity_file, PathBuf::from("/proc/1/cpuset"));
        assert_eq!(settings.invoke_options(), InvokeOptions::default());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
runtime = "podman"
image = "lambci/lambda:python3.8"
handler = "handler.main"
task_dir = "/srv/fn"
clean_up = false
add_env_vars = true
docker_args = ["--memory", "256m"]
encoding = "latin1"
"#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.runtime, "podman");
        assert_eq!(settings.identity_file, PathBuf::from("/proc/1/cpuset"));

        let options = settings.invoke_options();
        assert_eq!(options.docker_image.as_deref(), Some("lambci/lambda:python3.8"));
        assert_eq!(options.handler.as_deref(), Some("handler.main"));
        assert_eq!(options.task_dir, Some(PathBuf::from("/srv/fn")));
        assert_eq!(options.clean_up, Some(false));
        assert_eq!(options.add_env_vars, Some(true));
        assert_eq!(
            options.docker_args,
            Some(vec!["--memory".to_string(), "256m".to_string()])
        );
        assert_eq!(
            options.spawn_options.map(|s| s.encoding),
            Some(Encoding::Latin1)
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }
}
