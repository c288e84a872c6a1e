//! `kedeploy create-deployment` - Render and apply a Deployment plus ScaledObject
//!
//! Pipeline: validate the values file, connect, render the Deployment
//! manifest, create-or-patch it, then (if scaling is configured) render and
//! create-or-patch the ScaledObject. The Deployment is always applied first
//! so the ScaledObject's scale target exists.

use std::path::PathBuf;

use clap::Args;

use super::{connect, context_label};
use crate::reconcile::{self, Applied, DeploymentOps, ScaledObjectOps};
use crate::values::{load_values, DeploymentValues};
use crate::{render, Result};

/// Create a deployment and KEDA ScaledObject from a YAML values file
#[derive(Args, Debug)]
pub struct CreateDeploymentArgs {
    /// Path to a YAML file with deployment values
    #[arg(long = "values", value_name = "FILE")]
    pub values_path: PathBuf,
}

pub async fn run(args: CreateDeploymentArgs, context: Option<&str>) -> Result<()> {
    println!(
        "-> Loading and validating values from '{}'...",
        args.values_path.display()
    );
    let values = load_values(&args.values_path)?;
    println!("Values file is valid.");

    println!(
        "-> Connecting to Kubernetes cluster (context: {})...",
        context_label(context)
    );
    let client = connect(context).await?;
    println!("Successfully connected.");

    println!("\n--- Preparing Deployment ---");
    let rendered = render::render_deployment(&values)?;
    println!("{}", rendered);
    let body: serde_json::Value = serde_yaml::from_str(&rendered)?;
    let ops = DeploymentOps::new(client.clone(), &values.namespace);
    match reconcile::apply(&ops, &values.name, &body).await? {
        Applied::Created => println!("Deployment '{}' created.", values.name),
        Applied::Patched => println!("Deployment '{}' patched.", values.name),
    }

    if values.scaling.is_some() {
        println!("\n--- Preparing ScaledObject ---");
        let rendered = render::render_scaled_object(&values)?;
        println!("{}", rendered);
        let body: serde_json::Value = serde_yaml::from_str(&rendered)?;
        let so_name = values.scaled_object_name();
        let ops = ScaledObjectOps::new(client, &values.namespace);
        match reconcile::apply(&ops, &so_name, &body).await? {
            Applied::Created => println!("ScaledObject '{}' created.", so_name),
            Applied::Patched => println!("ScaledObject '{}' patched.", so_name),
        }
    }

    print_summary(&values);
    Ok(())
}

fn print_summary(values: &DeploymentValues) {
    println!("\nDeployment Summary");
    println!("--------------------------");
    println!("  Deployment Name: {}", values.name);
    println!("  Namespace:       {}", values.namespace);
    println!("  Container Image: {}", values.image);
    println!("  Container Port:  {}", values.port);
    if let Some(scaling) = &values.scaling {
        println!("\n  --- KEDA Scaling ---");
        println!("  Trigger Type:     {}", scaling.trigger_type);
        println!(
            "  Min/Max Replicas: {} / {}",
            scaling.min_replicas, scaling.max_replicas
        );
        println!("  ScaledObject:     {}", values.scaled_object_name());
    }
    println!("--------------------------");
    println!(
        "\nTo check status, run: kedeploy get-status {} --namespace {}",
        values.name, values.namespace
    );
}
