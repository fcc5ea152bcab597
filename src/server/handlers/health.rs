use axum::extract::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    status: String,
    message: String,
}

pub async fn check() -> Json<Health> {
    Json(Health {
        status: "OK".into(),
        message: "Server is running".into(),
    })
}

#[test]
fn reports_ok() {
    let Json(health) = tokio_test::block_on(check());
    assert_eq!(health.status, "OK");
}
