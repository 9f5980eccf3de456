mod context;

pub mod add;
pub mod auth;
pub mod delete;
pub mod init;
pub mod list;
pub mod search;
pub mod secret;
pub mod show;
pub mod update;
