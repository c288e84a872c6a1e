//! kedeploy library
//!
//! A CLI that automates three Kubernetes operator tasks: verifying cluster
//! connectivity, installing the KEDA autoscaling add-on via helm, and
//! rendering/applying a Deployment plus ScaledObject from a values file.

pub mod commands;
pub mod error;
pub mod helm;
pub mod poll;
pub mod reconcile;
pub mod render;
pub mod values;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// kedeploy - deploy KEDA-autoscaled workloads to Kubernetes
#[derive(Parser, Debug)]
#[command(name = "kedeploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The Kubernetes context to use. Overrides the current context in your kubeconfig.
    #[arg(long, global = true)]
    pub context: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the connection to the Kubernetes cluster
    CheckConnection,

    /// Install KEDA on the cluster using helm
    InstallTools,

    /// Create a deployment and KEDA ScaledObject from a YAML values file
    CreateDeployment(commands::create_deployment::CreateDeploymentArgs),

    /// Get the health status for a deployment
    GetStatus(commands::get_status::GetStatusArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        let context = self.context.as_deref();
        match self.command {
            Commands::CheckConnection => commands::check_connection::run(context).await,
            Commands::InstallTools => commands::install_tools::run(context).await,
            Commands::CreateDeployment(args) => {
                commands::create_deployment::run(args, context).await
            }
            Commands::GetStatus(args) => commands::get_status::run(args, context).await,
        }
    }
}
