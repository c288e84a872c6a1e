//! `kedeploy check-connection` - Verify cluster connectivity

use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};

use super::{connect, context_label};
use crate::{Error, Result};

pub async fn run(context: Option<&str>) -> Result<()> {
    println!(
        "Attempting to connect to cluster (context: {})...",
        context_label(context)
    );
    let client = connect(context).await?;

    // A cheap list proves the control plane actually answers, not just that
    // a client could be constructed.
    let namespaces: Api<Namespace> = Api::all(client);
    namespaces
        .list(&ListParams::default().limit(1))
        .await
        .map_err(|e| Error::connection(format!("connection test failed, API error: {}", e)))?;

    println!("Successfully connected to the Kubernetes cluster.");
    if let Some(ctx) = context {
        println!("Using context: '{}'", ctx);
    }
    Ok(())
}
