//! Auth flow integration tests.
//!
//! Covers registration, login, logout, session persistence, and the
//! redirect behavior of protected routes.

mod common;

use axum::http::{header, StatusCode};
use tower::ServiceExt;

use common::*;

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn unauthenticated_access_redirects_to_login() {
        let app = build_app(default_quotes()).await;

        for uri in ["/", "/buy", "/sell", "/quote", "/history"] {
            let response = app.router.clone().oneshot(get(uri, "")).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::TEMPORARY_REDIRECT,
                "{uri} should redirect"
            );
            let location = response
                .headers()
                .get(header::LOCATION)
                .unwrap()
                .to_str()
                .unwrap();
            assert!(
                location.starts_with("/login"),
                "{uri} should redirect to /login, got: {location}"
            );
        }
    }

    #[tokio::test]
    async fn login_page_accessible_without_auth() {
        let app = build_app(default_quotes()).await;

        let response = app.router.oneshot(get("/login", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Log In"));
    }

    #[tokio::test]
    async fn register_logs_in_and_grants_starting_cash() {
        let app = build_app(default_quotes()).await;

        let cookies = register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;
        assert!(!cookies.is_empty(), "register should set a session cookie");

        let response = app.router.clone().oneshot(get("/", &cookies)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(TEST_USERNAME));
        assert!(html.contains("Registered!"));
        assert!(html.contains("$10,000.00"));

        // The flash shows once.
        let response = app.router.oneshot(get("/", &cookies)).await.unwrap();
        let html = body_string(response).await;
        assert!(!html.contains("Registered!"));
    }

    #[tokio::test]
    async fn register_rejects_password_mismatch() {
        let app = build_app(default_quotes()).await;

        let response = app
            .router
            .oneshot(form_post(
                "/register",
                "",
                "username=bob&password=Passw0rd!&confirmation=Other0ne!",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("passwords do not match"));
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let app = build_app(default_quotes()).await;

        let response = app
            .router
            .oneshot(form_post(
                "/register",
                "",
                "username=bob&password=password&confirmation=password",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("password too weak"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let app = build_app(default_quotes()).await;

        register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;
        let response = app
            .router
            .oneshot(form_post(
                "/register",
                "",
                &format!(
                    "username={TEST_USERNAME}&password={TEST_PASSWORD}&confirmation={TEST_PASSWORD}"
                ),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("already taken"));
    }

    #[tokio::test]
    async fn register_rejects_blank_username() {
        let app = build_app(default_quotes()).await;

        let response = app
            .router
            .oneshot(form_post(
                "/register",
                "",
                "username=&password=Passw0rd!&confirmation=Passw0rd!",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_with_correct_credentials_redirects_home() {
        let app = build_app(default_quotes()).await;
        register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;

        let response = app
            .router
            .oneshot(form_post(
                "/login",
                "",
                &format!("username={TEST_USERNAME}&password={TEST_PASSWORD}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/");
        assert!(!extract_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn login_with_wrong_password_rejected() {
        let app = build_app(default_quotes()).await;
        register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;

        let response = app
            .router
            .oneshot(form_post(
                "/login",
                "",
                &format!("username={TEST_USERNAME}&password=WrongPass1!"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let html = body_string(response).await;
        assert!(html.contains("invalid username or password"));
    }

    #[tokio::test]
    async fn login_with_unknown_username_rejected() {
        let app = build_app(default_quotes()).await;

        let response = app
            .router
            .oneshot(form_post("/login", "", "username=nobody&password=Passw0rd!"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let html = body_string(response).await;
        assert!(html.contains("invalid username or password"));
    }

    #[tokio::test]
    async fn login_with_blank_fields_rejected() {
        let app = build_app(default_quotes()).await;

        let response = app
            .router
            .oneshot(form_post("/login", "", "username=&password="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let html = body_string(response).await;
        assert!(html.contains("must provide username and password"));
    }

    #[tokio::test]
    async fn logout_destroys_session() {
        let app = build_app(default_quotes()).await;
        let cookies = register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;

        let response = app
            .router
            .clone()
            .oneshot(form_post("/logout", &cookies, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/login");

        let response = app.router.oneshot(get("/", &cookies)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn login_follows_next_parameter() {
        let app = build_app(default_quotes()).await;
        register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;

        let response = app
            .router
            .oneshot(form_post(
                "/login",
                "",
                &format!("username={TEST_USERNAME}&password={TEST_PASSWORD}&next=/history"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/history");
    }

    #[tokio::test]
    async fn login_ignores_offsite_next_parameter() {
        let app = build_app(default_quotes()).await;
        register_user(&app.router, TEST_USERNAME, TEST_PASSWORD).await;

        let response = app
            .router
            .oneshot(form_post(
                "/login",
                "",
                &format!("username={TEST_USERNAME}&password={TEST_PASSWORD}&next=//evil.example"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/");
    }

    #[tokio::test]
    async fn responses_carry_no_cache_headers() {
        let app = build_app(default_quotes()).await;

        let response = app.router.oneshot(get("/login", "")).await.unwrap();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(cache_control, "no-cache, no-store, must-revalidate");
        assert_eq!(response.headers().get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(response.headers().get(header::EXPIRES).unwrap(), "0");
    }

    #[tokio::test]
    async fn unknown_route_renders_not_found() {
        let app = build_app(default_quotes()).await;

        let response = app.router.oneshot(get("/no-such-page", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
