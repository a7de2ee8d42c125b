//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ─► CorsLayer ─► Router                                      │
//! │                              ├── /health                  public        │
//! │                              ├── /auth, /users            mixed         │
//! │                              ├── /category, /menu         public/admin  │
//! │                              ├── /promo                   public/admin  │
//! │                              ├── /transaction             mixed         │
//! │                              ├── /settlement              kasir/admin   │
//! │                              └── /report                  kasir/admin   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Authentication happens in the [`CurrentUser`](crate::auth::CurrentUser)
//! extractor; each handler states the roles it admits.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod promo;
pub mod report;
pub mod settlement;
pub mod transaction;

use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderValue, Method};
use axum::Json;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(catalog::router())
        .merge(promo::router())
        .merge(transaction::router())
        .merge(settlement::router())
        .merge(report::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// `Json<T>` whose rejection uses the error envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::new(ErrorCode::ValidationError, rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::services::test_support::{memory_db, seed_login_user, seed_menu, test_state, TEST_PASSWORD, TEST_SERVER_KEY};
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use resto_core::Role;
    use resto_payment::signature;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> (Router, resto_db::Database) {
        let db = memory_db().await;
        let (state, _gateway) = test_state(db.clone());
        (router(state), db)
    }

    async fn body_json(res: Response<Body>) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        (status, body_json(res).await)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn login_as(app: &Router, db: &resto_db::Database, name: &str, role: Role) -> String {
        let user = seed_login_user(db, name, role).await;
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({ "email": user.email, "password": TEST_PASSWORD }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    fn checkout_body(menu_id: &str, method: &str) -> Value {
        json!({
            "customer_name": "Rina",
            "customer_phone": "08123456789",
            "customer_email": "rina@example.com",
            "order_type": "take_away",
            "payment_method": method,
            "items": [{ "menu_id": menu_id, "quantity": 2 }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _db) = app().await;
        let (status, body) = send(&app, get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["database"], true);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_usable_for_me() {
        let (app, db) = app().await;
        let siti = seed_login_user(&db, "Siti", Role::Kasir).await;

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                json!({ "email": siti.email, "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));

        let body = body_json(res).await;
        assert!(body["data"]["user"].get("password_hash").is_none());

        let pair = cookie.split(';').next().unwrap().to_string();
        let me = Request::builder()
            .uri("/auth/me")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, me).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], siti.email);
    }

    #[tokio::test]
    async fn test_missing_token_is_401_envelope() {
        let (app, _db) = app().await;
        let (status, body) = send(&app, get("/transaction", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_role_token_is_403() {
        let (app, _db) = app().await;
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u-1".into(),
            email: "x@resto.test".into(),
            role: "waiter".into(),
            iat: now,
            exp: now + 3600,
            jti: "j-1".into(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();

        let (status, _) = send(&app, get("/transaction", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_gates() {
        let (app, db) = app().await;
        let koki = login_as(&app, &db, "Koki", Role::Koki).await;
        let kasir = login_as(&app, &db, "Kasir", Role::Kasir).await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;

        let (status, body) = send(&app, json_request("POST", "/transaction", None, checkout_body(&menu.id, "cash"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["transaction"]["id"].as_str().unwrap().to_string();

        let uri = format!("/transaction/{id}/cash-paid");
        let (status, _) = send(&app, json_request("PATCH", &uri, Some(&koki), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, json_request("PATCH", &uri, Some(&kasir), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payment_status"], "paid");

        let (status, _) = send(&app, get("/report/charts", Some(&kasir))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let menu_body = json!({ "name": "Es Teh", "price_cents": 500_000, "category_id": menu.category_id });
        let (status, _) = send(&app, json_request("POST", "/menu", Some(&kasir), menu_body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_staff_account_management() {
        let (app, db) = app().await;
        let admin = login_as(&app, &db, "Admin", Role::Admin).await;
        let kasir = login_as(&app, &db, "Kasir", Role::Kasir).await;
        let koki = seed_login_user(&db, "Koki", Role::Koki).await;
        let admin_id = db.users().get_by_email("admin@resto.test").await.unwrap().unwrap().id;

        let (status, _) = send(&app, json_request("DELETE", &format!("/users/{}", koki.id), Some(&kasir), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, json_request("DELETE", &format!("/users/{admin_id}"), Some(&admin), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = send(&app, json_request("DELETE", &format!("/user/{}", koki.id), Some(&admin), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, json_request("DELETE", &format!("/users/{}", koki.id), Some(&admin), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let change = |old: &str| json!({ "old_password": old, "new_password": "baru12345" });
        let (status, _) = send(&app, json_request("PUT", "/auth/change-password", Some(&kasir), change("salah"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, json_request("PUT", "/auth/change-password", Some(&kasir), change(TEST_PASSWORD))).await;
        assert_eq!(status, StatusCode::OK);

        let login = json!({ "email": "kasir@resto.test", "password": "baru12345" });
        let (status, _) = send(&app, json_request("POST", "/auth/login", None, login)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_checkout_and_order_status_flow() {
        let (app, db) = app().await;
        let kasir = login_as(&app, &db, "Kasir", Role::Kasir).await;
        let koki = login_as(&app, &db, "Koki", Role::Koki).await;
        let menu = seed_menu(&db, "Bakso", 1_000_000, true).await;

        let (status, body) = send(&app, json_request("POST", "/transaction", None, checkout_body(&menu.id, "cash"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["transaction"]["total_cents"], 2_200_000);
        assert!(body["data"]["payment"].is_null());
        let id = body["data"]["transaction"]["id"].as_str().unwrap().to_string();

        let status_uri = format!("/transaction/{id}/order-status");
        let (status, _) = send(&app, json_request("PATCH", &status_uri, Some(&koki), json!({ "order_status": "cooking" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, json_request("PATCH", &status_uri, Some(&kasir), json!({ "order_status": "cooking" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["order_status"], "cooking");

        let (status, body) = send(&app, get(&format!("/transaction/{id}"), Some(&koki))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_envelope() {
        let (app, _db) = app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/transaction")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_webhook_signature() {
        let (app, db) = app().await;
        let menu = seed_menu(&db, "Soto", 1_000_000, true).await;

        let (status, body) = send(&app, json_request("POST", "/transaction", None, checkout_body(&menu.id, "e_wallet"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"]["payment"]["token"].is_string());
        let id = body["data"]["transaction"]["id"].as_str().unwrap().to_string();

        let mut notification = json!({
            "order_id": id,
            "transaction_status": "settlement",
            "status_code": "200",
            "gross_amount": "22000.00",
            "signature_key": "forged",
        });
        let (status, _) = send(&app, json_request("POST", "/transaction/notification", None, notification.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        notification["signature_key"] = json!(signature::sign(&id, "200", "22000.00", TEST_SERVER_KEY));
        let (status, body) = send(&app, json_request("POST", "/transaction/notification", None, notification)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payment_status"], "paid");
        assert_eq!(body["data"]["order_status"], "completed");
    }
}
