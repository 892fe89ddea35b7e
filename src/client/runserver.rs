use chrono::Duration;
use clap::Args;

use crate::views;

use super::StorageConfig;

#[derive(Args, Debug)]
#[command(about, long_about = "Launch the server")]
pub struct RunserverArgs {
    #[arg(long, env = "DOCSTORE_PORT", default_value_t = 8090)]
    port: u16,
    #[arg(long, env = "DOCSTORE_ADDRESS", default_value_t = String::from("0.0.0.0"))]
    address: String,
    /// The timeout to use when performing the healthcheck, in milliseconds
    #[clap(long, env = "DOCSTORE_HEALTH_CHECK_TIMEOUT_MS", default_value_t = 1000)]
    health_check_timeout_ms: u64,
    /// Longest wait for the per-document critical section taken by a full
    /// re-upload, in milliseconds
    #[clap(long, env = "DOCSTORE_REUPLOAD_LOCK_TIMEOUT_MS", default_value_t = 5000)]
    reupload_lock_timeout_ms: u64,
}

/// Create and run the server
pub async fn runserver(
    RunserverArgs {
        port,
        address,
        health_check_timeout_ms,
        reupload_lock_timeout_ms,
    }: RunserverArgs,
    storage: StorageConfig,
    app_version: Option<String>,
) -> anyhow::Result<()> {
    let config = views::ServerConfig {
        port,
        address,
        health_check_timeout: Duration::milliseconds(health_check_timeout_ms as i64),
        reupload_lock_timeout: Duration::milliseconds(reupload_lock_timeout_ms as i64),
        storage_root: storage.storage_root,
        app_version,
    };

    let server = views::Server::new(config).await?;
    Ok(server.start().await?)
}
