pub mod auth;
pub mod blog;
pub mod company;
pub mod project;
pub mod project_type;
pub mod public;
pub mod shared;
pub mod user;
