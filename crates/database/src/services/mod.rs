pub mod profile;
pub mod report;
pub mod request;
pub mod restaurant;
pub mod table;
