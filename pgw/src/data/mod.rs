mod bearer;
mod config;
mod pdn_connection;
mod teid;
pub mod apns;

pub use bearer::*;
pub use config::*;
pub use pdn_connection::*;
pub use teid::*;
