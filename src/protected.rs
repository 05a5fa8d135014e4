use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use warp::{http::StatusCode, path, Filter, Rejection, Reply};

use crate::{
    auth::Auth,
    routes::{envelope, with_auth, MAX_BODY_BYTES},
    types::{ApiResponse, Claims},
};

/// Demo resources that are only served to holders of a valid bearer token.
pub fn build_protected_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let profile = path!("protected" / "profile")
        .and(warp::get())
        .and(with_auth(auth))
        .map(get_profile);

    let data = path!("protected" / "data")
        .and(warp::get())
        .and(with_auth(auth))
        .map(get_protected_data);

    let action = path!("protected" / "action")
        .and(warp::post())
        .and(with_auth(auth))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .map(perform_action);

    profile.or(data).or(action)
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub username: String,
    pub user_id: String,
    pub role: String,
    pub last_login: DateTime<Utc>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedData {
    pub accessed_by: String,
    pub access_time: DateTime<Utc>,
    pub secret_data: String,
    pub numbers: Vec<u32>,
    pub settings: DisplaySettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplaySettings {
    pub theme: String,
    pub language: String,
    pub notifications: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub performed_by: String,
    pub action_time: DateTime<Utc>,
    /// The request body, passed through untouched.
    pub action_data: Value,
    pub result: String,
}

fn get_profile(claims: Claims) -> impl Reply {
    debug!(username = %claims.sub, "serving profile");

    envelope(
        StatusCode::OK,
        &ApiResponse::ok(
            "Profile data retrieved successfully",
            ProfileData {
                username: claims.sub,
                user_id: claims.user_id,
                role: "Demo User".into(),
                last_login: Utc::now() - Duration::hours(2),
                permissions: vec!["read".into(), "write".into(), "demo".into()],
            },
        ),
    )
}

fn get_protected_data(claims: Claims) -> impl Reply {
    debug!(username = %claims.sub, "serving protected data");

    envelope(
        StatusCode::OK,
        &ApiResponse::ok(
            "Protected data accessed successfully",
            ProtectedData {
                accessed_by: claims.sub,
                access_time: Utc::now(),
                secret_data: "This is protected information that requires authentication".into(),
                numbers: vec![1, 2, 3, 42, 100],
                settings: DisplaySettings {
                    theme: "dark".into(),
                    language: "en".into(),
                    notifications: true,
                },
            },
        ),
    )
}

fn perform_action(claims: Claims, action_data: Value) -> impl Reply {
    debug!(username = %claims.sub, "performing action");

    envelope(
        StatusCode::OK,
        &ApiResponse::ok(
            "Action performed successfully",
            ActionResult {
                performed_by: claims.sub,
                action_time: Utc::now(),
                action_data,
                result: "Action completed successfully".into(),
            },
        ),
    )
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration as StdDuration};

    use serde_json::json;

    use super::*;
    use crate::{auth::AuthConfig, credentials::StaticCredentials, routes::handle_auth_errors};

    fn test_auth() -> Auth {
        Auth::new(AuthConfig {
            auth_token_secret: "test-256-bit-secret-key-for-testing-purposes-only".into(),
            auth_token_lifetime: StdDuration::from_secs(60 * 60),
            credentials: Arc::new(StaticCredentials::demo()),
        })
    }

    fn bearer(auth: &Auth, username: &str, user_id: &str) -> String {
        format!("Bearer {}", auth.tokens().issue(username, user_id).unwrap().token)
    }

    #[tokio::test]
    async fn profile_reports_the_token_subject() {
        let auth = test_auth();
        let routes = build_protected_route_filter(&auth).recover(handle_auth_errors);

        let response = warp::test::request()
            .method("GET")
            .path("/protected/profile")
            .header("authorization", bearer(&auth, "testuser", "12345"))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<ProfileData> = serde_json::from_slice(response.body()).unwrap();
        assert!(body.success);
        assert_eq!(body.message, "Profile data retrieved successfully");
        let profile = body.data.unwrap();
        assert_eq!(profile.username, "testuser");
        assert_eq!(profile.user_id, "12345");
        assert_eq!(profile.role, "Demo User");
        assert_eq!(profile.permissions, ["read", "write", "demo"]);
        assert!(profile.last_login < Utc::now());
    }

    #[tokio::test]
    async fn data_is_attributed_to_the_token_subject() {
        let auth = test_auth();
        let routes = build_protected_route_filter(&auth).recover(handle_auth_errors);

        let response = warp::test::request()
            .method("GET")
            .path("/protected/data")
            .header("authorization", bearer(&auth, "testuser", "12345"))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<ProtectedData> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.message, "Protected data accessed successfully");
        let data = body.data.unwrap();
        assert_eq!(data.accessed_by, "testuser");
        assert_eq!(data.numbers, [1, 2, 3, 42, 100]);
        assert_eq!(data.settings.theme, "dark");
        assert!(data.settings.notifications);
    }

    #[tokio::test]
    async fn action_payload_is_passed_through() {
        let auth = test_auth();
        let routes = build_protected_route_filter(&auth).recover(handle_auth_errors);
        let payload = json!({ "message": "test action", "id": 123, "nested": { "ok": [1, 2] } });

        let response = warp::test::request()
            .method("POST")
            .path("/protected/action")
            .header("authorization", bearer(&auth, "testuser", "12345"))
            .json(&payload)
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<ActionResult> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.message, "Action performed successfully");
        let result = body.data.unwrap();
        assert_eq!(result.performed_by, "testuser");
        assert_eq!(result.action_data, payload);
        assert_eq!(result.result, "Action completed successfully");
    }

    #[tokio::test]
    async fn action_requires_a_json_body() {
        let auth = test_auth();
        let routes = build_protected_route_filter(&auth).recover(handle_auth_errors);

        let response = warp::test::request()
            .method("POST")
            .path("/protected/action")
            .header("authorization", bearer(&auth, "testuser", "12345"))
            .body("not json")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn every_resource_requires_a_token() {
        let routes = build_protected_route_filter(&test_auth()).recover(handle_auth_errors);

        for (method, path) in [
            ("GET", "/protected/profile"),
            ("GET", "/protected/data"),
            ("POST", "/protected/action"),
        ] {
            let response = warp::test::request()
                .method(method)
                .path(path)
                .json(&json!({}))
                .reply(&routes)
                .await;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
            let body: ApiResponse<Value> = serde_json::from_slice(response.body()).unwrap();
            assert!(!body.success);
            assert!(body.data.is_none());
        }
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let routes = build_protected_route_filter(&test_auth()).recover(handle_auth_errors);

        let response = warp::test::request()
            .method("GET")
            .path("/protected/profile")
            .header("authorization", "Bearer invalid.jwt.token")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: ApiResponse<Value> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.message, "Invalid or expired token");
    }
}
