pub mod handlers;
pub mod service;

pub use service::{create_billing, delete_billing, list_billings, set_classification, update_billing};
