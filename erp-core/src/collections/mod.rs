pub mod handlers;
pub mod service;

pub use service::{create_collection, delete_collection, list_collections};
