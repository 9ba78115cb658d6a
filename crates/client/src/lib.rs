pub mod api;
pub mod config;
pub mod customer;
pub mod dashboard;
pub mod error;
pub mod sse;

pub use api::ServiceClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
