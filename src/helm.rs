//! Helm driver for installing the KEDA chart.
//!
//! Three shell-outs, each failing fast on nonzero exit with the captured
//! stderr surfaced: add the KEDA chart repository, refresh repositories, and
//! `helm upgrade --install` the chart into its own namespace. Idempotency is
//! helm's own (`upgrade --install` and `repo add` tolerate re-runs).

use tokio::process::Command;
use tracing::info;

use crate::{Error, Result};

pub const KEDA_REPO_NAME: &str = "kedacore";
pub const KEDA_REPO_URL: &str = "https://kedacore.github.io/charts";
pub const KEDA_CHART: &str = "kedacore/keda";
pub const KEDA_RELEASE: &str = "keda";
pub const KEDA_NAMESPACE: &str = "keda";
pub const KEDA_OPERATOR_DEPLOYMENT: &str = "keda-operator";

fn repo_add_args() -> Vec<&'static str> {
    vec!["repo", "add", KEDA_REPO_NAME, KEDA_REPO_URL]
}

fn repo_update_args() -> Vec<&'static str> {
    vec!["repo", "update"]
}

fn install_chart_args() -> Vec<&'static str> {
    vec![
        "upgrade",
        "--install",
        KEDA_RELEASE,
        KEDA_CHART,
        "--namespace",
        KEDA_NAMESPACE,
        "--create-namespace",
    ]
}

/// Run one helm invocation, failing with captured stderr on nonzero exit.
async fn run_helm(args: &[&str], description: &str) -> Result<()> {
    info!("running: helm {}", args.join(" "));
    let output = Command::new("helm").args(args).output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            helm_missing()
        } else {
            Error::command_failed(format!("could not run helm: {}", e))
        }
    })?;

    if !output.status.success() {
        return Err(Error::command_failed(format!(
            "{} failed: {}",
            description,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn helm_missing() -> Error {
    Error::command_failed(
        "helm not found on PATH; install it from https://helm.sh/docs/intro/install/",
    )
}

/// Verify that a working `helm` binary is reachable.
pub async fn ensure_installed() -> Result<()> {
    run_helm(&["version", "--short"], "helm version check").await
}

/// Add and refresh the KEDA chart repository.
pub async fn add_keda_repo() -> Result<()> {
    run_helm(&repo_add_args(), "add KEDA helm repo").await?;
    run_helm(&repo_update_args(), "update helm repos").await
}

/// Install or upgrade the KEDA chart into the `keda` namespace.
pub async fn install_keda_chart() -> Result<()> {
    run_helm(&install_chart_args(), "install KEDA chart").await
}
