//! CLI commands and shared cluster-client plumbing.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::{Error, Result};

pub mod check_connection;
pub mod create_deployment;
pub mod get_status;
pub mod install_tools;

/// Build a kube [`Client`], optionally selecting a kubeconfig context.
///
/// With no context the kube defaults apply (`KUBECONFIG` env / `~/.kube/config`
/// / in-cluster). With a context the kubeconfig is read and that context is
/// selected explicitly.
pub async fn connect(context: Option<&str>) -> Result<Client> {
    match context {
        None => Client::try_default()
            .await
            .map_err(|e| Error::connection(format!("could not create cluster client: {}", e))),
        Some(ctx) => {
            let kubeconfig = Kubeconfig::read()
                .map_err(|e| Error::connection(format!("could not read kubeconfig: {}", e)))?;
            let options = KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            };
            let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| {
                    Error::connection(format!("could not load context '{}': {}", ctx, e))
                })?;
            Client::try_from(config)
                .map_err(|e| Error::connection(format!("could not create cluster client: {}", e)))
        }
    }
}

/// Context name for user-facing messages.
pub(crate) fn context_label(context: Option<&str>) -> &str {
    context.unwrap_or("default")
}
