use std::sync::Arc;

use anyhow::anyhow;
use docstore_storage::ContentStore;

use crate::views;

use super::StorageConfig;

pub async fn healthcheck_cmd(storage: StorageConfig) -> anyhow::Result<()> {
    let content = Arc::new(ContentStore::new(storage.storage_root));

    views::check_health(content)
        .await
        .map_err(|e| anyhow!("healthcheck failed: {e}"))?;

    tracing::info!("✅ Healthcheck passed");
    Ok(())
}
