mod handler;
pub mod model;

pub use handler::{create_blog, delete_blog, get_blog, list_blogs};
