//! HTTP endpoint serving Prometheus metrics.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{error, info};

use smbmetrics_core::collector::StatusCommand;

use crate::collectors::SmbMetrics;
use crate::error::ExporterError;

pub const DEFAULT_PORT: u16 = 9922;
pub const METRICS_PATH: &str = "/metrics";

pub fn router<C: StatusCommand + 'static>(metrics: Arc<SmbMetrics<C>>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler::<C>))
        .with_state(metrics)
}

/// Socket to listen on. Without an explicit address this is the IPv6
/// wildcard, which also accepts IPv4 clients on dual-stack hosts.
pub fn bind_addr(address: Option<IpAddr>, port: u16) -> SocketAddr {
    SocketAddr::new(address.unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED)), port)
}

/// Listens on [`bind_addr`] until the server fails.
pub async fn serve<C: StatusCommand + 'static>(
    metrics: Arc<SmbMetrics<C>>,
    address: Option<IpAddr>,
    port: u16,
) -> Result<(), ExporterError> {
    let addr = bind_addr(address, port);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(%addr, error = %e, "failed to listen");
        e
    })?;
    info!(%addr, path = METRICS_PATH, "serving metrics");

    axum::serve(listener, router(metrics)).await.map_err(|e| {
        error!(%addr, error = %e, "HTTP server failure");
        ExporterError::Io(e)
    })
}

/// GET /metrics - Prometheus text format.
async fn metrics_handler<C: StatusCommand + 'static>(
    State(metrics): State<Arc<SmbMetrics<C>>>,
) -> Response {
    // smbstatus runs as a blocking subprocess
    match tokio::task::spawn_blocking(move || metrics.render()).await {
        Ok(Ok(text)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            text,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "rendering metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding error").into_response()
        }
        Err(e) => {
            error!(error = %e, "metrics task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smbmetrics_core::collector::{MockSmbStatus, SmbStatusCollector};
    use smbmetrics_core::versions::Versions;

    fn metrics(mock: MockSmbStatus) -> Arc<SmbMetrics<MockSmbStatus>> {
        Arc::new(SmbMetrics::new(
            SmbStatusCollector::new(mock),
            Versions::default(),
            true,
        ))
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_bind_addr() {
        assert_eq!(bind_addr(None, DEFAULT_PORT).to_string(), "[::]:9922");
        let local: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(bind_addr(Some(local), 8080).to_string(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        let mock = MockSmbStatus::new().with_output(
            &["--json"],
            r#"{"tcons": {"1": {"service": "share1", "machine": "::1"}}}"#,
        );
        let resp = metrics_handler(State(metrics(mock))).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            prometheus::TEXT_FORMAT
        );
        let text = body_text(resp).await;
        assert!(text.contains("smb_tcon_total 1"));
        assert!(text.contains("smb_share_byremote{machine=\"::1\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_handler_without_data() {
        let resp = metrics_handler(State(metrics(MockSmbStatus::new()))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("smb_sessions_total 0"));
        assert!(text.contains("smb_metrics_status"));
    }
}
