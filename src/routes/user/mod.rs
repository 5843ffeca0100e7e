mod handler;
pub mod model;

pub use handler::{list_users, login, logout, profile, register};
