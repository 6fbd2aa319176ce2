use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{TestApp, image, routes};

#[tokio::test]
async fn create_blog_stores_rows_and_files() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app
        .create_blog(&token, "Launch day", &["cover.png", "team photo.jpg"])
        .await;

    assert_eq!(res.body["title"], "Launch day");
    assert_eq!(res.body["created_by"], "Site Admin");
    let images = res.body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["image_name"], "cover.png");
    assert_eq!(images[1]["image_name"], "team photo.jpg");
    for image in images {
        let url = image["image_url"].as_str().unwrap();
        assert!(url.contains("/images/blogs/"), "{url}");
        assert!(!url.contains(' '), "{url}");
        assert!(app.blob_exists(url));
    }

    let served = app
        .client
        .get(images[0]["image_url"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(served.status().as_u16(), 200);
}

#[tokio::test]
async fn reserved_url_characters_in_file_names_still_resolve() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app
        .create_blog(&token, "Odd names", &["a#1.png", "b?x.png", "c%41.png"])
        .await;

    let images = res.body["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    for image in images {
        let url = image["image_url"].as_str().unwrap();
        assert!(!url.contains(['#', '?', '%']), "{url}");
        assert!(app.blob_exists(url), "{url}");

        let served = app.client.get(url).send().await.unwrap();
        assert_eq!(served.status().as_u16(), 200, "{url}");
    }
}

#[tokio::test]
async fn create_blog_requires_images() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = Form::new().text("title", "No pics").text("content", "Words");
    let res = app.multipart_with_token(routes::BLOGS, form, &token).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn rejected_upload_leaves_no_files_behind() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let text_file = Part::bytes(b"not an image".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = Form::new()
        .text("title", "Mixed")
        .text("content", "Words")
        .part("images[]", image("ok.png"))
        .part("images[]", text_file);
    let res = app.multipart_with_token(routes::BLOGS, form, &token).await;

    assert_eq!(res.status, 400);
    assert_eq!(app.blob_count("blogs"), 0);
    let list = app.get_with_token(routes::BLOGS, &token).await;
    assert_eq!(list.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn update_blog_changes_text_and_updater() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let id = app.create_blog(&admin, "Draft", &["a.png"]).await.id();

    let res = app
        .put_with_token(
            &routes::blog(id),
            &json!({"title": "Final", "content": "Polished"}),
            &editor,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Final");
    assert_eq!(res.body["created_by"], "Site Admin");
    assert_eq!(res.body["updated_by"], "Editor");
}

#[tokio::test]
async fn delete_blog_removes_images_and_files() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let blog = app.create_blog(&token, "Gone soon", &["a.png", "b.png"]).await;
    let id = blog.id();
    let urls: Vec<String> = blog.body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["image_url"].as_str().unwrap().to_string())
        .collect();

    let res = app.delete_with_token(&routes::blog(id), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    for url in &urls {
        assert!(!app.blob_exists(url), "{url} should be removed");
    }
    assert_eq!(app.get_with_token(&routes::blog(id), &token).await.status, 404);
    assert_eq!(app.get_without_token(&routes::public_blog(id)).await.status, 404);

    let again = app.delete_with_token(&routes::blog(id), &token).await;
    assert_eq!(again.status, 404);
    assert_eq!(again.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_survives_a_missing_file() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let blog = app.create_blog(&token, "Half there", &["a.png", "b.png"]).await;
    let first = blog.str("/images/0/image_url");
    let second = blog.str("/images/1/image_url");
    std::fs::remove_file(app.blob_path(&first)).unwrap();

    let res = app.delete_with_token(&routes::blog(blog.id()), &token).await;

    assert_eq!(res.status, 204, "{}", res.text);
    assert!(!app.blob_exists(&second));
}

#[tokio::test]
async fn add_images_touches_the_blog() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let id = app.create_blog(&admin, "Gallery", &["a.png"]).await.id();

    let form = Form::new()
        .part("images[]", image("b.png"))
        .part("images[]", image("c.gif"));
    let res = app
        .multipart_with_token(&routes::blog_images(id), form, &editor)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let blog = app.get_with_token(&routes::blog(id), &admin).await;
    assert_eq!(blog.body["images"].as_array().unwrap().len(), 3);
    assert_eq!(blog.body["updated_by"], "Editor");
}

#[tokio::test]
async fn add_images_to_missing_blog_stores_nothing() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = Form::new().part("images[]", image("b.png"));
    let res = app
        .multipart_with_token(&routes::blog_images(999), form, &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(app.blob_count("blogs"), 0);
}

#[tokio::test]
async fn delete_one_image_touches_the_blog_and_keeps_siblings() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    let blog = app.create_blog(&admin, "Pair", &["a.png", "b.png"]).await;
    let image_id = blog.body["images"][0]["id"].as_i64().unwrap() as i32;
    let removed = blog.str("/images/0/image_url");
    let kept = blog.str("/images/1/image_url");

    let res = app
        .delete_with_token(&routes::blog_image(image_id), &editor)
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert!(!app.blob_exists(&removed));
    assert!(app.blob_exists(&kept));
    let after = app.get_with_token(&routes::blog(blog.id()), &admin).await;
    assert_eq!(after.body["images"].as_array().unwrap().len(), 1);
    assert_eq!(after.body["updated_by"], "Editor");
}
