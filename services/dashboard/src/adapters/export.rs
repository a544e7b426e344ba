//! services/dashboard/src/adapters/export.rs

use super::remote::RemoteClient;
use async_trait::async_trait;
use dairy_track_core::ports::{ExportService, PortError, PortResult};
use reqwest::Method;
use std::sync::Arc;
use tracing::{info, warn};

/// Triggers the remote PDF and Excel exports of milk production.
///
/// The remote renders the file; this adapter only checks that it accepted the request.
#[derive(Clone)]
pub struct HttpExportAdapter {
    remote: Arc<RemoteClient>,
}

impl HttpExportAdapter {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }

    async fn trigger(&self, path: &str, fallback: &str) -> PortResult<()> {
        let response = self
            .remote
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, path, "export request rejected");
            return Err(PortError::Remote(fallback.to_string()));
        }
        info!(path, "export triggered");
        Ok(())
    }
}

#[async_trait]
impl ExportService for HttpExportAdapter {
    async fn export_pdf(&self) -> PortResult<()> {
        self.trigger("milk-production/export/pdf", "Failed to export PDF").await
    }

    async fn export_excel(&self) -> PortResult<()> {
        self.trigger("milk-production/export/excel", "Failed to export Excel").await
    }
}
