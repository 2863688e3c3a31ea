use chess_link::api::router::create_router;
use chess_link::api::state::AppState;
use chess_link::config::AppConfig;

#[tokio::main]
async fn main() {
    // Container HEALTHCHECK entry point.
    if std::env::args().any(|a| a == "--health-check") {
        match health_check().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("chess-link health check failed: {e}");
                std::process::exit(1);
            }
        }
    }

    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_link=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr();
    let state = AppState::new(config);

    tracing::info!(
        dictionary = state.codec.dictionary().len(),
        cache_capacity = state.codec.cache().capacity(),
        "chess-link v{} starting on {bind_addr}",
        env!("CARGO_PKG_VERSION")
    );

    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind to {bind_addr}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

/// Check the local server's `/health` and require a 200 with `"status":"ok"`.
async fn health_check() -> Result<(), Box<dyn std::error::Error>> {
    check_health_at(&format!("127.0.0.1:{}", AppConfig::from_env().port)).await
}

async fn check_health_at(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    let mut stream = tokio::net::TcpStream::connect(addr).await?;
    stream.write_all(request.as_bytes()).await?;

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await?;
    let reply = String::from_utf8_lossy(&reply);

    let status = reply.lines().next().unwrap_or_default();
    if !status.contains(" 200 ") {
        return Err(format!("health endpoint answered {status:?}").into());
    }
    if !reply.contains(r#""status":"ok""#) {
        return Err("health endpoint did not report ok".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_accepts_running_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let app = create_router(AppState::new(AppConfig::default()));
        tokio::spawn(async move { axum::serve(listener, app).await });

        check_health_at(&addr).await.unwrap();
    }

    #[tokio::test]
    async fn health_check_rejects_missing_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(check_health_at(&addr).await.is_err());
    }
}
