use std::net::SocketAddr;

use tokio::net::TcpListener;

use tredd_server::config::{Config, LedgerConfig, LimitsConfig, StoreConfig};
use tredd_server::routes;
use tredd_server::state::AppState;

pub struct TestServer {
    pub url: String,
    pub state: AppState,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    // Held so the content tree and seller key outlive the test.
    #[allow(dead_code)]
    dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            content_dir: dir.path().join("content").display().to_string(),
            seller_key_path: dir.path().join("seller.key").display().to_string(),
            store: StoreConfig {
                backend: "memory".into(),
                path: String::new(),
            },
            ledger: LedgerConfig {
                backend: "memory".into(),
            },
            limits: LimitsConfig {
                // Deadline tests run on short real windows.
                min_reveal_lead_ms: 10,
                max_refund_window_ms: 60 * 60 * 1000,
                claim_grace_ms: 10,
            },
        };

        let state = AppState::new(&config).unwrap();
        let _ = state.spawn_claim_worker();
        let app = routes::router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            url: format!("http://{addr}"),
            state,
            addr,
            dir,
        }
    }
}
