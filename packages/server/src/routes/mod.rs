use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{auth, blog, company, customer, project, project_type, users};
use crate::state::AppState;
use crate::utils::upload::upload_body_limit;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/admin", admin_routes(config))
        .nest("/customer", customer_routes())
}

fn admin_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let json = OpenApiRouter::new()
        .routes(routes!(auth::login))
        .routes(routes!(auth::profile))
        .routes(routes!(auth::edit_profile))
        .routes(routes!(auth::change_password))
        .routes(routes!(users::list_users, users::register_user))
        .routes(routes!(users::get_user, users::update_user, users::delete_user))
        .routes(routes!(users::set_user_password))
        .routes(routes!(blog::list_blogs))
        .routes(routes!(blog::get_blog, blog::update_blog, blog::delete_blog))
        .routes(routes!(blog::delete_blog_image))
        .routes(routes!(
            project_type::list_project_types,
            project_type::create_project_type
        ))
        .routes(routes!(
            project_type::get_project_type,
            project_type::update_project_type,
            project_type::delete_project_type
        ))
        .routes(routes!(project::list_projects))
        .routes(routes!(project::get_project, project::delete_project))
        .routes(routes!(project::update_project))
        .routes(routes!(project::update_feature))
        .routes(routes!(project::delete_feature))
        .routes(routes!(project::delete_feature_image))
        .routes(routes!(company::get_company, company::update_company))
        .routes(routes!(company::add_social_media))
        .routes(routes!(
            company::update_social_media,
            company::delete_social_media
        ))
        .routes(routes!(company::add_contact))
        .routes(routes!(company::update_contact, company::delete_contact));

    let upload = OpenApiRouter::new()
        .routes(routes!(blog::create_blog))
        .routes(routes!(blog::add_blog_images))
        .routes(routes!(project::create_project))
        .routes(routes!(project::replace_thumbnail))
        .routes(routes!(project::add_feature))
        .routes(routes!(project::add_feature_images))
        .routes(routes!(company::create_company))
        .routes(routes!(company::replace_logo))
        .layer(upload_body_limit(&config.storage));

    json.merge(upload)
}

fn customer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(customer::company_details))
        .routes(routes!(customer::list_blogs))
        .routes(routes!(customer::get_blog))
        .routes(routes!(customer::list_project_types))
        .routes(routes!(customer::list_projects))
        .routes(routes!(customer::get_project))
}
