pub mod profiles;
pub mod requests;
pub mod restaurants;
pub mod tables;
