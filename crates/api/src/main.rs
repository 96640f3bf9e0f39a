#[tokio::main]
async fn main() -> anyhow::Result<()> {
    registra_observability::init();

    let app = registra_api::app::build_app().await?;

    let addr = std::env::var("REGISTRA_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
