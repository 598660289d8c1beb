pub mod admin;
pub mod health;
pub mod profile;
pub mod submission;
