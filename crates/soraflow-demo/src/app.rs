//! Route definitions for the demo backend
//!
//! Serves a landing page at `/` and a JSON API under `/api`:
//! `/api/health` for probes and `/api/message` for a status payload
//! the frontend renders.

use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Payload returned by /api/message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: String,
    pub environment: String,
    pub database: String,
}

pub fn router() -> Router {
    let api = Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/message", get(message).fallback(method_not_allowed))
        .layer(middleware::from_fn(cors));

    Router::new().route("/", get(index)).nest("/api", api)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn message() -> Json<MessageResponse> {
    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let database = if std::env::var("DATABASE_URL").is_ok() {
        "Connected"
    } else {
        "Not configured"
    };

    Json(MessageResponse {
        message: "Hello from the backend!".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        environment,
        database: database.to_string(),
    })
}

/// The API accepts GET only; everything else gets an Allow header back
async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        format!("Method {} Not Allowed", method),
    )
        .into_response()
}

/// CORS headers for every /api response
///
/// CorsLayer panics on the credentials + wildcard origin combination,
/// so the headers are set by hand.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,OPTIONS,PATCH,DELETE,POST,PUT"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(
            "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version",
        ),
    );

    response
}

/// Landing page with a card that fetches /api/message on load
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Backend Demo</title>
  <meta name="description" content="Demo of the web stack backend">
  <style>
    .container { min-height: 100vh; padding: 0 0.5rem; display: flex; flex-direction: column; justify-content: center; align-items: center; }
    main { padding: 5rem 0; flex: 1; display: flex; flex-direction: column; justify-content: center; align-items: center; max-width: 800px; width: 100%; margin: 0 auto; }
    .card { margin: 1rem; padding: 1.5rem; text-align: left; border: 1px solid #eaeaea; border-radius: 10px; width: 100%; }
    .card:hover { border-color: #0070f3; }
    .error { color: #e74c3c; }
  </style>
</head>
<body>
  <div class="container">
    <main>
      <h1>Welcome to the Backend Demo</h1>
      <div class="card">
        <h2>Backend Response:</h2>
        <div id="response"><p>Loading...</p></div>
      </div>
    </main>
  </div>
  <script>
    fetch('/api/message')
      .then((response) => {
        if (!response.ok) throw new Error('Failed to fetch message');
        return response.json();
      })
      .then((data) => {
        document.getElementById('response').innerHTML = [
          '<p><strong>Message:</strong> ' + data.message + '</p>',
          '<p><strong>Timestamp:</strong> ' + new Date(data.timestamp).toLocaleString() + '</p>',
          '<p><strong>Environment:</strong> ' + data.environment + '</p>',
          '<p><strong>Database Status:</strong> ' + data.database + '</p>',
        ].join('');
      })
      .catch((err) => {
        document.getElementById('response').innerHTML =
          '<p class="error">Error: ' + err.message + '</p>';
      });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use serial_test::serial;
    use tower::ServiceExt;

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let app = router();

        let response = app.oneshot(get_request("/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    #[serial]
    async fn test_message_payload_defaults() {
        // SAFETY: #[serial] なので環境変数の変更が他のテストと競合しない
        unsafe {
            std::env::remove_var("APP_ENV");
            std::env::remove_var("DATABASE_URL");
        }

        let app = router();
        let response = app.oneshot(get_request("/api/message")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Hello from the backend!");
        assert_eq!(json["environment"], "development");
        assert_eq!(json["database"], "Not configured");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    #[serial]
    async fn test_message_reflects_environment() {
        // SAFETY: #[serial] なので環境変数の変更が他のテストと競合しない
        unsafe {
            std::env::set_var("APP_ENV", "production");
            std::env::set_var("DATABASE_URL", "sqlserver://webstack-sql");
        }

        let app = router();
        let response = app.oneshot(get_request("/api/message")).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["environment"], "production");
        assert_eq!(json["database"], "Connected");

        unsafe {
            std::env::remove_var("APP_ENV");
            std::env::remove_var("DATABASE_URL");
        }
    }

    #[tokio::test]
    async fn test_non_get_is_rejected_with_allow_header() {
        let app = router();

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/message")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Method POST Not Allowed");
    }

    #[tokio::test]
    async fn test_api_responses_carry_cors_headers() {
        let app = router();

        let response = app.oneshot(get_request("/api/health")).await.unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,OPTIONS,PATCH,DELETE,POST,PUT"
        );
    }

    #[tokio::test]
    async fn test_index_serves_landing_page() {
        let app = router();

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Welcome to the Backend Demo"));
        assert!(html.contains("/api/message"));
    }
}
