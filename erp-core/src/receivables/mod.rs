pub mod derive;
pub mod handlers;
pub mod service;

pub use derive::{
    derive_receivables, derive_status, remaining_amount, summarize, Receivable, ReceivableStatus,
    ReceivableSummary,
};
pub use handlers::list_receivables_handler;
