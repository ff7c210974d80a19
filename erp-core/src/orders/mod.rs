pub mod handlers;
pub mod hierarchy;
pub mod service;
pub mod validation;


pub use hierarchy::{build_order_rows, OrderRow, SourcedAttachment};
pub use service::{create_order, delete_order, list_order_rows, list_orders, update_order};
