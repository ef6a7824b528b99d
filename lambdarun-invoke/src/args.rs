//! Container CLI argument construction

use crate::options::ResolvedOptions;

/// Mount point of the task directory inside the runtime container
pub const TASK_MOUNT: &str = "/var/task";

/// Variables forwarded into the container when env passthrough is on.
/// Only names are passed; the container CLI reads values from its own
/// environment.
pub const PASSTHROUGH_ENV_VARS: [&str; 12] = [
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "AWS_ACCOUNT_ID",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_LAMBDA_FUNCTION_NAME",
    "AWS_LAMBDA_FUNCTION_VERSION",
    "AWS_LAMBDA_FUNCTION_MEMORY_SIZE",
    "AWS_LAMBDA_FUNCTION_TIMEOUT",
    "AWS_LAMBDA_FUNCTION_HANDLER",
    "AWS_LAMBDA_EVENT_BODY",
];

/// Build the full argument list for `<runtime> run ...`.
///
/// An empty `parent` counts as no parent for the volume mount. The network
/// mode follows `nested` alone, so nested mode without a parent produces
/// `container:` and the runtime rejects the run.
pub fn build_args(options: &ResolvedOptions, parent: Option<&str>, nested: bool) -> Vec<String> {
    let network_parent = parent.unwrap_or_default();
    let parent = parent.filter(|p| !p.is_empty());
    let mut args = vec!["run".to_string()];

    match parent {
        Some(parent) => {
            args.push("--volumes-from".to_string());
            args.push(parent.to_string());
        }
        None => {
            args.push("-v".to_string());
            args.push(format!("{}:{}", options.task_dir.display(), TASK_MOUNT));
        }
    }

    args.push("--network".to_string());
    if nested {
        args.push(format!("container:{network_parent}"));
    } else {
        args.push("host".to_string());
    }

    if options.clean_up {
        args.push("--rm".to_string());
    }

    if options.add_env_vars {
        for name in PASSTHROUGH_ENV_VARS {
            args.push("-e".to_string());
            args.push(name.to_string());
        }
    }

    args.extend(options.docker_args.iter().cloned());

    args.push(options.docker_image.clone());
    args.push(options.handler.clone());
    args.push(options.event.to_string());

    args
}
