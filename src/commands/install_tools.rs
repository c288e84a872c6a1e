//! `kedeploy install-tools` - Install KEDA on the cluster using helm
//!
//! Sequences the helm driver and then verifies the install by polling the
//! `keda-operator` Deployment until it reports ready replicas. Ctrl-C cancels
//! the verification wait.

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::Api;
use kube::Client;
use tokio_util::sync::CancellationToken;

use super::{connect, context_label};
use crate::poll::{self, PollOutcome, PollSchedule, Probe};
use crate::{helm, Error, Result};

pub async fn run(context: Option<&str>) -> Result<()> {
    println!("Step 1: Checking for helm...");
    helm::ensure_installed().await?;
    println!("helm is installed.");

    println!(
        "\nStep 2: Connecting to Kubernetes cluster (context: {})...",
        context_label(context)
    );
    let client = connect(context).await?;
    println!("Successfully connected.");

    println!("\nStep 3: Adding KEDA helm repository...");
    helm::add_keda_repo().await?;
    println!("KEDA repo added successfully.");

    println!("\nStep 4: Installing KEDA chart (this may take a moment)...");
    helm::install_keda_chart().await?;
    println!("KEDA chart installation command executed.");

    println!("\nStep 5: Verifying KEDA installation on the cluster...");
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });
    verify_keda_installation(client, &cancel).await?;

    println!("\nKEDA installation successful and verified!");
    Ok(())
}

/// Poll the KEDA operator Deployment until it reports at least one ready
/// replica. Not-found and found-but-not-ready both keep polling; any other
/// API error stops immediately.
async fn verify_keda_installation(client: Client, cancel: &CancellationToken) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(client, helm::KEDA_NAMESPACE);
    let schedule = PollSchedule::default();

    let outcome = poll::run(schedule, cancel, "KEDA operator readiness", || {
        let api = api.clone();
        async move { probe_operator(&api).await }
    })
    .await;

    match outcome {
        PollOutcome::Ready { .. } => {
            println!("KEDA operator deployment is running and ready.");
            Ok(())
        }
        PollOutcome::TimedOut { attempts } => Err(Error::timeout(format!(
            "KEDA operator deployment did not become ready after {} attempts",
            attempts
        ))),
        PollOutcome::Failed { message, .. } => Err(Error::command_failed(format!(
            "API error verifying KEDA: {}",
            message
        ))),
        PollOutcome::Cancelled => Err(Error::command_failed("KEDA verification cancelled")),
    }
}

async fn probe_operator(api: &Api<Deployment>) -> Probe {
    match api.get_status(helm::KEDA_OPERATOR_DEPLOYMENT).await {
        Ok(deployment) => {
            let ready = deployment
                .status
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0);
            if ready > 0 {
                Probe::Ready
            } else {
                println!("KEDA operator deployment found, but not ready yet. Retrying...");
                Probe::Pending
            }
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("KEDA operator deployment not found yet. Retrying...");
            Probe::Pending
        }
        Err(e) => Probe::Fatal(e.to_string()),
    }
}
