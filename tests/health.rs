use ecommerce_backend::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn health_check_reports_crate_version() {
    let response = health_check().await;
    let data = response.0.data.expect("health data");
    assert!(!data.version.is_empty());
}
