use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, image, routes};

#[tokio::test]
async fn company_is_missing_until_created() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app.get_with_token(routes::COMPANY, &token).await;
    assert_eq!(res.status, 404);

    let created = app.create_company(&token).await;
    assert_eq!(created.body["name"], "Acme Studio");
    assert_eq!(created.body["founded_date"], "2019-04-01");
    assert!(app.blob_exists(&created.str("/logo_url")));

    let res = app.get_with_token(routes::COMPANY, &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.id(), created.id());
}

#[tokio::test]
async fn only_one_company_can_exist() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_company(&token).await;

    let form = Form::new()
        .text("name", "Second")
        .text("description", "d")
        .text("vision", "v")
        .text("goal", "g")
        .text("founded_date", "2020-01-01")
        .text("address", "a")
        .part("logo", image("second.png"));
    let res = app.multipart_with_token(routes::COMPANY, form, &token).await;

    assert_eq!(res.status, 409);
    assert_eq!(app.blob_count("company"), 1);
}

#[tokio::test]
async fn concurrent_creates_leave_a_single_company() {
    use cms_server::entity::company;
    use sea_orm::{EntityTrait, PaginatorTrait};

    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = |name: &str| {
        Form::new()
            .text("name", name.to_string())
            .text("description", "d")
            .text("vision", "v")
            .text("goal", "g")
            .text("founded_date", "2020-01-01")
            .text("address", "a")
            .part("logo", image(&format!("{name}.png")))
    };
    let (first, second) = tokio::join!(
        app.multipart_with_token(routes::COMPANY, form("first"), &token),
        app.multipart_with_token(routes::COMPANY, form("second"), &token),
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses[0], 201, "{} / {}", first.text, second.text);
    // The loser either saw the row (409) or lost the write lock (503).
    assert!(matches!(statuses[1], 409 | 503), "{} / {}", first.text, second.text);

    assert_eq!(company::Entity::find().count(&app.db).await.unwrap(), 1);
    assert_eq!(app.blob_count("company"), 1);
}

#[tokio::test]
async fn founded_date_must_be_iso() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = Form::new()
        .text("name", "Acme")
        .text("description", "d")
        .text("vision", "v")
        .text("goal", "g")
        .text("founded_date", "01/04/2019")
        .text("address", "a")
        .part("logo", image("logo.png"));
    let res = app.multipart_with_token(routes::COMPANY, form, &token).await;

    assert_eq!(res.status, 400);
    assert_eq!(app.blob_count("company"), 0);
}

#[tokio::test]
async fn update_company_reassigns_updater() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    app.create_company(&admin).await;

    let res = app
        .put_with_token(
            routes::COMPANY,
            &json!({
                "name": "Acme Labs",
                "description": "We research things",
                "vision": "Everywhere",
                "goal": "Ship",
                "founded_date": "2018-12-31",
                "address": "2 Main Street",
            }),
            &editor,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Acme Labs");
    assert_eq!(res.body["founded_date"], "2018-12-31");
    assert_eq!(res.body["created_by"], "Site Admin");
    assert_eq!(res.body["updated_by"], "Editor");
}

#[tokio::test]
async fn logo_replacement_removes_the_old_file() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let old_url = app.create_company(&token).await.str("/logo_url");

    let form = Form::new().part("logo", image("new-logo.svg"));
    let res = app
        .multipart_with_token(routes::COMPANY_LOGO, form, &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let new_url = res.str("/logo_url");
    assert!(new_url.ends_with("_new-logo.svg"));
    assert!(app.blob_exists(&new_url));
    assert!(!app.blob_exists(&old_url));
    assert_eq!(app.blob_count("company"), 1);
}

#[tokio::test]
async fn social_media_links_touch_the_company() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    app.create_company(&admin).await;

    let res = app
        .post_with_token(
            routes::SOCIAL_MEDIA,
            &json!({"platform_name": "Facebook", "page_url": "https://facebook.com/acme"}),
            &editor,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let link = res.id();

    let company = app.get_with_token(routes::COMPANY, &admin).await;
    assert_eq!(company.body["updated_by"], "Editor");
    assert_eq!(company.body["social_media"][0]["platform_name"], "Facebook");

    let res = app
        .put_with_token(
            &routes::social_media(link),
            &json!({"platform_name": "Facebook", "page_url": "https://fb.com/acme"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["page_url"], "https://fb.com/acme");
    let company = app.get_with_token(routes::COMPANY, &admin).await;
    assert_eq!(company.body["updated_by"], "Site Admin");

    let res = app.delete_with_token(&routes::social_media(link), &editor).await;
    assert_eq!(res.status, 204, "{}", res.text);
    let company = app.get_with_token(routes::COMPANY, &admin).await;
    assert_eq!(company.body["social_media"].as_array().unwrap().len(), 0);
    assert_eq!(company.body["updated_by"], "Editor");
}

#[tokio::test]
async fn page_url_must_be_a_url() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_company(&token).await;

    let res = app
        .post_with_token(
            routes::SOCIAL_MEDIA,
            &json!({"platform_name": "Facebook", "page_url": "facebook"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn contacts_need_a_company() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::CONTACTS,
            &json!({"department": "Sales", "phone_number": "123"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn contact_lifecycle_touches_the_company() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "Editor", "editor@example.com", "editor-pass")
        .await;
    let editor = app.login("editor@example.com", "editor-pass").await;
    app.create_company(&admin).await;

    let res = app
        .post_with_token(
            routes::CONTACTS,
            &json!({"department": "Sales", "phone_number": "123"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let contact = res.id();

    let res = app
        .put_with_token(
            &routes::contact(contact),
            &json!({"department": "Support", "phone_number": "456"}),
            &editor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["department"], "Support");
    let company = app.get_with_token(routes::COMPANY, &admin).await;
    assert_eq!(company.body["updated_by"], "Editor");

    let res = app.delete_with_token(&routes::contact(contact), &admin).await;
    assert_eq!(res.status, 204, "{}", res.text);
    let again = app.delete_with_token(&routes::contact(contact), &admin).await;
    assert_eq!(again.status, 404);

    let company = app.get_with_token(routes::COMPANY, &admin).await;
    assert_eq!(company.body["contacts"].as_array().unwrap().len(), 0);
    assert_eq!(company.body["updated_by"], "Site Admin");
}
