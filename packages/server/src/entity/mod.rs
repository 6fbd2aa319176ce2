pub mod blog;
pub mod blog_image;
pub mod company;
pub mod company_contact;
pub mod company_project;
pub mod company_social_media;
pub mod feature_image;
pub mod project_feature;
pub mod project_type;
pub mod user;
