//! `kedeploy get-status` - One-shot deployment health report
//!
//! Reads the Deployment's replica counts once (no polling), classifies the
//! overall health, and lists the pods selected by the `app=<name>` label with
//! a per-pod phase classification.

use clap::Args;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};

use super::{connect, context_label};
use crate::{Error, Result};

/// Get the health status for a deployment
#[derive(Args, Debug)]
pub struct GetStatusArgs {
    /// Name of the deployment
    pub deployment_name: String,

    /// The namespace of the deployment
    #[arg(long, default_value = "default")]
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Healthy,
    Progressing,
}

impl Health {
    fn label(self) -> &'static str {
        match self {
            Health::Healthy => "Healthy",
            Health::Progressing => "Progressing",
        }
    }
}

/// Healthy only when every requested replica is ready and at least one exists.
fn classify(ready: i32, total: i32) -> Health {
    if total > 0 && ready == total {
        Health::Healthy
    } else {
        Health::Progressing
    }
}

/// Fixed three-way pod phase marker: running, pending, anything else.
fn phase_marker(phase: &str) -> &'static str {
    match phase {
        "Running" => "✓",
        "Pending" => "⟳",
        _ => "✗",
    }
}

pub async fn run(args: GetStatusArgs, context: Option<&str>) -> Result<()> {
    println!(
        "-> Connecting to Kubernetes cluster (context: {})...",
        context_label(context)
    );
    let client = connect(context).await?;
    println!("Successfully connected.");

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), &args.namespace);
    let deployment = match deployments.get_status(&args.deployment_name).await {
        Ok(d) => d,
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            return Err(Error::validation(format!(
                "deployment '{}' not found in namespace '{}'",
                args.deployment_name, args.namespace
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let status = deployment.status.unwrap_or_default();
    let total = status.replicas.unwrap_or(0);
    let ready = status.ready_replicas.unwrap_or(0);
    let available = status.available_replicas.unwrap_or(0);
    let health = classify(ready, total);

    println!("\n--- Deployment Status: {} ---", args.deployment_name);
    println!("  Namespace: {}", args.namespace);
    println!("  Health:    {}", health.label());
    println!("  Replicas:  {}/{} Ready ({} available)", ready, total, available);

    println!("\n  --- Pods ---");
    let pods: Api<Pod> = Api::namespaced(client, &args.namespace);
    let selector = format!("app={}", args.deployment_name);
    let pod_list = pods
        .list(&ListParams::default().labels(&selector))
        .await
        .map_err(Error::from)?;

    if pod_list.items.is_empty() {
        println!("  No pods found for this deployment.");
        return Ok(());
    }

    for pod in pod_list.items {
        let name = pod.metadata.name.unwrap_or_default();
        let phase = pod
            .status
            .and_then(|s| s.phase)
            .unwrap_or_else(|| "Unknown".to_string());
        println!("  - {}  (Status: {} {})", name, phase, phase_marker(&phase));
    }

    Ok(())
}
