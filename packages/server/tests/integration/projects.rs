use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, image, routes};

mod project_types {
    use super::*;

    #[tokio::test]
    async fn type_name_must_be_unique_among_live_types() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_project_type(&token, "Web").await;

        let dup = app
            .post_with_token(
                routes::PROJECT_TYPES,
                &json!({"type_name": "Web", "description": "again"}),
                &token,
            )
            .await;
        assert_eq!(dup.status, 400);
        assert_eq!(dup.body["code"], "VALIDATION_ERROR");

        let same_name = app
            .put_with_token(
                &routes::project_type(id),
                &json!({"type_name": "Web", "description": "Reworded"}),
                &token,
            )
            .await;
        assert_eq!(same_name.status, 200, "{}", same_name.text);
        assert_eq!(same_name.body["description"], "Reworded");

        app.delete_with_token(&routes::project_type(id), &token).await;
        app.create_project_type(&token, "Web").await;
    }

    #[tokio::test]
    async fn description_is_required() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::PROJECT_TYPES,
                &json!({"type_name": "Mobile", "description": "  "}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn deleting_a_type_cascades_through_projects() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let web = app.create_project_type(&token, "Web").await;
        let mobile = app.create_project_type(&token, "Mobile").await;

        let shop = app.create_project(&token, web, "Shop").await;
        let blog = app.create_project(&token, web, "Blog").await;
        let app_project = app.create_project(&token, mobile, "App").await;
        let gallery = app
            .add_feature(&token, shop.id(), "Gallery", &["g1.png", "g2.png"])
            .await;
        let checkout = app.add_feature(&token, shop.id(), "Checkout", &["c1.png"]).await;
        let kept_feature = app
            .add_feature(&token, app_project.id(), "Offline", &["o1.png"])
            .await;

        let feature_urls = [
            gallery.str("/images/0/image_url"),
            gallery.str("/images/1/image_url"),
            checkout.str("/images/0/image_url"),
        ];

        let res = app.delete_with_token(&routes::project_type(web), &token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        for url in &feature_urls {
            assert!(!app.blob_exists(url), "{url} should be removed");
        }
        assert!(app.blob_exists(&kept_feature.str("/images/0/image_url")));
        // Thumbnails are not part of the feature-image cleanup.
        assert!(app.blob_exists(&shop.str("/thumbnail_url")));

        for id in [shop.id(), blog.id()] {
            assert_eq!(app.get_with_token(&routes::project(id), &token).await.status, 404);
        }
        assert_eq!(
            app.get_with_token(&routes::project(app_project.id()), &token)
                .await
                .status,
            200
        );

        let public = app.get_without_token(routes::PUBLIC_PROJECTS).await;
        let names: Vec<&str> = public
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["App"]);
    }
}

#[tokio::test]
async fn project_needs_a_live_type() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let web = app.create_project_type(&token, "Web").await;
    app.delete_with_token(&routes::project_type(web), &token).await;

    let form = Form::new()
        .text("name", "Orphan")
        .text("project_type_id", web.to_string())
        .text("description", "No home")
        .text("demo_url", "https://demo.example.com")
        .part("thumbnail", image("thumb.png"));
    let res = app.multipart_with_token(routes::PROJECTS, form, &token).await;

    assert_eq!(res.status, 404);
    assert_eq!(app.blob_count("projects"), 0);
}

#[tokio::test]
async fn demo_url_must_be_http() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let web = app.create_project_type(&token, "Web").await;
    let id = app.create_project(&token, web, "Shop").await.id();

    let res = app
        .put_with_token(
            &routes::project_details(id),
            &json!({
                "name": "Shop",
                "project_type_id": web,
                "description": "A project",
                "demo_url": "ftp://demo.example.com",
            }),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn update_details_can_move_project_to_another_type() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let web = app.create_project_type(&token, "Web").await;
    let mobile = app.create_project_type(&token, "Mobile").await;
    let id = app.create_project(&token, web, "Shop").await.id();

    let res = app
        .put_with_token(
            &routes::project_details(id),
            &json!({
                "name": "Shop App",
                "project_type_id": mobile,
                "description": "Now on phones",
                "demo_url": "https://shop.example.com",
            }),
            &token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Shop App");
    assert_eq!(res.body["project_type"]["type_name"], "Mobile");
}

#[tokio::test]
async fn new_thumbnail_replaces_the_old_file() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let web = app.create_project_type(&admin, "Web").await;
    let project = app.create_project(&admin, web, "Shop").await;
    let old_url = project.str("/thumbnail_url");

    let form = Form::new().part("thumbnail", image("fresh.png"));
    let res = app
        .multipart_with_token(&routes::project_thumbnail(project.id()), form, &editor)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let new_url = res.str("/thumbnail_url");
    assert_ne!(new_url, old_url);
    assert!(new_url.ends_with("_fresh.png"));
    assert!(app.blob_exists(&new_url));
    assert!(!app.blob_exists(&old_url));
    assert_eq!(res.body["updated_by"], "Editor");
}

#[tokio::test]
async fn feature_changes_touch_only_their_project() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let web = app.create_project_type(&admin, "Web").await;
    let shop = app.create_project(&admin, web, "Shop").await.id();
    let other = app.create_project(&admin, web, "Other").await.id();

    let feature = app.add_feature(&editor, shop, "Cart", &["cart.png"]).await;
    let project = app.get_with_token(&routes::project(shop), &admin).await;
    assert_eq!(project.body["updated_by"], "Editor");
    assert_eq!(project.body["features"][0]["title"], "Cart");

    let res = app
        .put_with_token(
            &routes::feature_details(feature.id()),
            &json!({"title": "Basket", "description": "Renamed"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Basket");
    let project = app.get_with_token(&routes::project(shop), &admin).await;
    assert_eq!(project.body["updated_by"], "Site Admin");

    let untouched = app.get_with_token(&routes::project(other), &admin).await;
    assert_eq!(untouched.body["updated_at"], untouched.body["created_at"]);
}

#[tokio::test]
async fn feature_images_can_be_added_and_removed() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let web = app.create_project_type(&admin, "Web").await;
    let shop = app.create_project(&admin, web, "Shop").await.id();
    let feature = app.add_feature(&admin, shop, "Cart", &["cart.png"]).await.id();

    let form = Form::new().part("images", image("more.png"));
    let res = app
        .multipart_with_token(&routes::feature_images(feature), form, &admin)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let images = res.body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    let image_id = images[1]["id"].as_i64().unwrap() as i32;
    let url = images[1]["image_url"].as_str().unwrap().to_string();

    let res = app
        .delete_with_token(&routes::feature_image(image_id), &editor)
        .await;
    assert_eq!(res.status, 204, "{}", res.text);
    assert!(!app.blob_exists(&url));

    let project = app.get_with_token(&routes::project(shop), &admin).await;
    assert_eq!(
        project.body["features"][0]["images"].as_array().unwrap().len(),
        1
    );
    assert_eq!(project.body["updated_by"], "Editor");
}

#[tokio::test]
async fn deleting_a_feature_removes_its_images() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let web = app.create_project_type(&token, "Web").await;
    let shop = app.create_project(&token, web, "Shop").await.id();
    let feature = app
        .add_feature(&token, shop, "Cart", &["a.png", "b.png"])
        .await;
    let urls = [
        feature.str("/images/0/image_url"),
        feature.str("/images/1/image_url"),
    ];

    let res = app.delete_with_token(&routes::feature(feature.id()), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    for url in &urls {
        assert!(!app.blob_exists(url));
    }
    let project = app.get_with_token(&routes::project(shop), &token).await;
    assert_eq!(project.body["features"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deleting_a_project_removes_feature_images() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let web = app.create_project_type(&token, "Web").await;
    let shop = app.create_project(&token, web, "Shop").await.id();
    let feature = app.add_feature(&token, shop, "Cart", &["a.png"]).await;
    app.add_feature(&token, shop, "Empty-ish", &["b.png"]).await;

    let res = app.delete_with_token(&routes::project(shop), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert!(!app.blob_exists(&feature.str("/images/0/image_url")));
    assert_eq!(
        app.delete_with_token(&routes::feature(feature.id()), &token)
            .await
            .status,
        404
    );
    let types = app.get_with_token(routes::PROJECT_TYPES, &token).await;
    assert_eq!(types.body.as_array().unwrap().len(), 1);
}
