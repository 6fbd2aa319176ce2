use serde_json::json;

use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn seeded_admin_can_log_in() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["token_type"], "bearer");
        assert_eq!(res.body["expires_in"], 3600);
        assert!(res.body["access_token"].as_str().unwrap().len() > 20);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email": ADMIN_EMAIL}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PROFILE).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_with_token(routes::PROFILE, "garbage").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn profile_shows_the_logged_in_user() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(routes::PROFILE, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], ADMIN_EMAIL);
        assert_eq!(res.body["name"], "Site Admin");
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn edit_profile_updates_fields() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .put_with_token(
                routes::EDIT_PROFILE,
                &json!({
                    "name": "Renamed",
                    "email": ADMIN_EMAIL,
                    "phone_number": "123",
                    "address": "Somewhere",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Renamed");
        assert_eq!(res.body["address"], "Somewhere");
    }

    #[tokio::test]
    async fn change_password_checks_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({"old_password": "wrong-password", "new_password": "brand-new-pass"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({"old_password": ADMIN_PASSWORD, "new_password": "brand-new-pass"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        app.login(ADMIN_EMAIL, "brand-new-pass").await;
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_log_in() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let id = app
            .create_user(&token, "Editor", "editor@example.com", "editor-pass")
            .await;
        let editor_token = app.login("editor@example.com", "editor-pass").await;

        let res = app.get_with_token(routes::PROFILE, &editor_token).await;
        assert_eq!(res.id(), id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "name": "Clone",
                    "email": ADMIN_EMAIL,
                    "password": "password123",
                    "password_confirmation": "password123",
                    "phone_number": "1",
                    "address": "x",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn password_confirmation_must_match() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "name": "Typo",
                    "email": "typo@example.com",
                    "password": "password123",
                    "password_confirmation": "password124",
                    "phone_number": "1",
                    "address": "x",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn admin_can_reset_another_users_password() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app
            .create_user(&token, "Editor", "editor@example.com", "editor-pass")
            .await;

        let res = app
            .post_with_token(
                &routes::user_password(id),
                &json!({"password": "reset-pass-1", "password_confirmation": "reset-pass-1"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        app.login("editor@example.com", "reset-pass-1").await;
    }

    #[tokio::test]
    async fn deleted_user_loses_access_and_frees_the_email() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app
            .create_user(&token, "Editor", "editor@example.com", "editor-pass")
            .await;
        let editor_token = app.login("editor@example.com", "editor-pass").await;

        let res = app.delete_with_token(&routes::user(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(routes::PROFILE, &editor_token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "editor@example.com", "password": "editor-pass"}),
            )
            .await;
        assert_eq!(res.status, 401);

        let res = app.get_with_token(&routes::user(id), &token).await;
        assert_eq!(res.status, 404);

        app.create_user(&token, "Editor Again", "editor@example.com", "editor-pass")
            .await;
    }

    #[tokio::test]
    async fn deleted_author_keeps_their_name_on_content() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app
            .create_user(&token, "Ghost Writer", "ghost@example.com", "ghost-pass")
            .await;
        let ghost_token = app.login("ghost@example.com", "ghost-pass").await;
        let blog_id = app.create_blog(&ghost_token, "Haunted", &["a.png"]).await.id();

        app.delete_with_token(&routes::user(id), &token).await;

        let res = app.get_with_token(&routes::blog(blog_id), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["created_by"], "Ghost Writer");
    }
}
