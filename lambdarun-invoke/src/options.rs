//! Invocation options

use lambdarun_core::InvokeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_IMAGE: &str = "lambci/lambda";
pub const DEFAULT_HANDLER: &str = "index.handler";

/// Text encoding used to decode the runtime's output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8, invalid sequences replaced with U+FFFD
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "binary")]
    Latin1,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "binary" => Ok(Self::Latin1),
            other => Err(format!("unsupported encoding: {other}")),
        }
    }
}

/// Options passed to the container runtime process itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    #[serde(default)]
    pub encoding: Encoding,

    /// Working directory of the runtime CLI process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extra environment for the runtime CLI process
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Caller-facing invocation options. Every field is optional; defaults are
/// applied by [`InvokeOptions::resolve`], which leaves `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeOptions {
    pub docker_image: Option<String>,
    pub handler: Option<String>,
    pub event: Option<Value>,
    pub task_dir: Option<PathBuf>,
    pub clean_up: Option<bool>,
    pub add_env_vars: Option<bool>,
    pub docker_args: Option<Vec<String>>,
    pub spawn_options: Option<SpawnOptions>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.docker_image = Some(image.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_event(mut self, event: Value) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the event from JSON text
    pub fn with_event_json(self, json: &str) -> Result<Self, InvokeError> {
        Ok(self.with_event(serde_json::from_str(json)?))
    }

    pub fn with_task_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.task_dir = Some(dir.into());
        self
    }

    pub fn with_clean_up(mut self, clean_up: bool) -> Self {
        self.clean_up = Some(clean_up);
        self
    }

    pub fn with_env_vars(mut self, add_env_vars: bool) -> Self {
        self.add_env_vars = Some(add_env_vars);
        self
    }

    pub fn with_docker_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.docker_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_spawn_options(mut self, spawn_options: SpawnOptions) -> Self {
        self.spawn_options = Some(spawn_options);
        self
    }

    /// Apply defaults, using `cwd` when no task directory is set
    pub fn resolve(&self, cwd: &Path) -> ResolvedOptions {
        ResolvedOptions {
            docker_image: self
                .docker_image
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            handler: self
                .handler
                .clone()
                .unwrap_or_else(|| DEFAULT_HANDLER.to_string()),
            event: match &self.event {
                Some(event) if !is_falsy(event) => event.clone(),
                _ => Value::Object(serde_json::Map::new()),
            },
            task_dir: self.task_dir.clone().unwrap_or_else(|| cwd.to_path_buf()),
            clean_up: self.clean_up.unwrap_or(true),
            add_env_vars: self.add_env_vars.unwrap_or(false),
            docker_args: self.docker_args.clone().unwrap_or_default(),
            spawn_options: self.spawn_options.clone().unwrap_or_default(),
        }
    }

    /// Apply defaults against the process working directory
    pub fn resolve_in_current_dir(&self) -> std::io::Result<ResolvedOptions> {
        match &self.task_dir {
            Some(dir) => Ok(self.resolve(dir)),
            None => Ok(self.resolve(&std::env::current_dir()?)),
        }
    }
}

/// `null`, `false`, zero and `""` all mean "no event"
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Invocation options with every default filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub docker_image: String,
    pub handler: String,
    pub event: Value,
    pub task_dir: PathBuf,
    pub clean_up: bool,
    pub add_env_vars: bool,
    pub docker_args: Vec<String>,
    pub spawn_options: SpawnOptions,
}
