pub mod auth;
pub mod projects;
pub mod roles;
pub mod tasks;
pub mod users;
