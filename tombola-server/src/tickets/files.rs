//! Card artifact rendering seam
//!
//! Server-side PDF/JPG rendering is currently disabled; cards are drawn
//! client-side from the persisted grid. The renderer still runs per card
//! so the artifact directory layout exists and rendering can be switched
//! back on without touching the issuance path.

use async_trait::async_trait;
use shared::models::{CardGrid, Order};
use std::path::PathBuf;

/// Artifact urls attached to a ticket, when rendering produced any
#[derive(Debug, Clone, Default)]
pub struct TicketArtifacts {
    pub pdf_url: Option<String>,
    pub jpg_url: Option<String>,
}

/// Produces printable artifacts for one card
///
/// Failures here are non-fatal: issuance logs them and stores the ticket
/// without artifact urls.
#[async_trait]
pub trait TicketRenderer: Send + Sync {
    async fn prepare(
        &self,
        event_id: &str,
        order: &Order,
        card_index: u32,
        grid: &CardGrid,
    ) -> anyhow::Result<TicketArtifacts>;
}

/// Renderer that only materializes the per-order artifact directory
///
/// Layout: `<files_root>/<event_id>/<order_id>/`.
pub struct DirectoryTicketRenderer {
    files_root: PathBuf,
}

impl DirectoryTicketRenderer {
    pub fn new(files_root: impl Into<PathBuf>) -> Self {
        Self {
            files_root: files_root.into(),
        }
    }
}

#[async_trait]
impl TicketRenderer for DirectoryTicketRenderer {
    async fn prepare(
        &self,
        event_id: &str,
        order: &Order,
        _card_index: u32,
        _grid: &CardGrid,
    ) -> anyhow::Result<TicketArtifacts> {
        let dir = self.files_root.join(event_id).join(&order.id);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(TicketArtifacts::default())
    }
}

/// Renderer that does nothing, for tests
pub struct NoopRenderer;

#[async_trait]
impl TicketRenderer for NoopRenderer {
    async fn prepare(
        &self,
        _event_id: &str,
        _order: &Order,
        _card_index: u32,
        _grid: &CardGrid,
    ) -> anyhow::Result<TicketArtifacts> {
        Ok(TicketArtifacts::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::OrderStatus;

    fn order(id: &str, event: &str) -> Order {
        Order {
            id: id.to_string(),
            event_id: event.to_string(),
            offer_id: None,
            buyer_name: "Ana".to_string(),
            buyer_phone: "3001234567".to_string(),
            buyer_email: None,
            vendor_code: None,
            vendor_id: None,
            vendor_name: None,
            format: "digital".to_string(),
            amount: 0,
            payment_method: "MANUAL".to_string(),
            payment_reference: None,
            payment_url: None,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
            paid_at: None,
            expires_at: None,
            expired_at: None,
            failed_at: None,
            tickets_issued_at: None,
            combos_count: 1,
            combo_size: 6,
            vendor_stats_applied: false,
        }
    }

    #[tokio::test]
    async fn test_directory_renderer_creates_order_dir() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = DirectoryTicketRenderer::new(dir.path());
        let grid = CardGrid {
            cols: [[0u8; 5]; 5],
        };

        let artifacts = renderer
            .prepare("E1", &order("o-1", "E1"), 0, &grid)
            .await
            .unwrap();
        assert!(artifacts.pdf_url.is_none());
        assert!(dir.path().join("E1").join("o-1").is_dir());
    }
}
