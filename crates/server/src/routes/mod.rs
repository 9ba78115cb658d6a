pub mod admin;
pub mod auth;
pub mod customer;
pub mod health;
pub mod reports;
pub mod root;
pub mod staff;
