pub mod board;
pub mod change;
pub mod cooldown;
pub mod heatmap;
pub mod report;
pub mod request;
pub mod request_type;
pub mod role;
pub mod slug;
pub mod status;
pub mod table;
pub mod time;
