mod support;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use support::TestApp;
use tower::ServiceExt as _;

async fn allowed_origin(app: &TestApp, origin: &str) -> anyhow::Result<Option<String>> {
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, origin)
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    Ok(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string))
}

#[tokio::test]
async fn health_reports_warehouse_version_without_caching() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["warehouse"], "PostgreSQL 16.2");
    assert_eq!(body["datasets"]["budget"], "public.budget");

    app.get("/health").await?;
    assert_eq!(app.warehouse.statement_count(), 2);
    assert!(app.state.cache.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn health_is_unavailable_when_warehouse_fails() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.warehouse.set_failing(true);

    let (status, body) = app.get("/health").await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    Ok(())
}

#[tokio::test]
async fn root_lists_configured_datasets() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["datasets"]["opportunities"], "public.opportunities");
    assert_eq!(body["datasets"]["budget"], "public.budget");
    Ok(())
}

#[tokio::test]
async fn cross_origin_requests_are_refused_by_default() -> anyhow::Result<()> {
    let app = TestApp::new();
    assert_eq!(allowed_origin(&app, "https://elsewhere.example").await?, None);
    Ok(())
}

#[tokio::test]
async fn configured_origin_is_allowed() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| {
        config.server.cors_origins = vec!["https://spend.example.gov".to_string()];
    });

    assert_eq!(
        allowed_origin(&app, "https://spend.example.gov").await?,
        Some("https://spend.example.gov".to_string())
    );
    assert_eq!(allowed_origin(&app, "https://elsewhere.example").await?, None);
    Ok(())
}
