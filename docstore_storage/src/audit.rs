use std::sync::Arc;

use chrono::Utc;

use crate::ContentHandle;
use crate::ContentStore;

/// Fixed, locale-independent timestamp format of audit records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Closed set of operation labels.
///
/// Audit lines are unescaped text, so labels must come from this fixed set
/// to keep the line format unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AuditOperation {
    Upload,
    Edit,
    Download,
}

/// Appends operation records to a document's own content blob.
///
/// One line per accepted operation, in the order the lifecycle layer commits
/// them: `"<timestamp> - <role_label> - <operation_label>\n"`.
pub struct AuditLog {
    store: Arc<ContentStore>,
}

impl AuditLog {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    pub fn format_record(role_label: &str, operation: AuditOperation) -> String {
        format!(
            "{} - {} - {}\n",
            Utc::now().format(TIMESTAMP_FORMAT),
            role_label,
            operation
        )
    }

    /// Records one operation line for a document.
    ///
    /// Best-effort: a `None` handle (content not materialized) is a no-op,
    /// and storage faults are logged and swallowed. The triggering operation
    /// is never failed by its audit record.
    pub async fn record(
        &self,
        handle: Option<&ContentHandle>,
        role_label: &str,
        operation: AuditOperation,
    ) {
        let Some(handle) = handle else {
            return;
        };
        let line = Self::format_record(role_label, operation);
        if let Err(error) = self.store.append(handle, &line).await {
            tracing::warn!(%error, blob = handle.name(), "failed to append audit record");
        }
    }
}
