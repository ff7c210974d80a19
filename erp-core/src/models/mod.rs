pub mod billing;
pub mod collection;
pub(crate) mod double_option;
pub mod order;
pub mod user;

pub use billing::{Billing, BillingType, Classification};
pub use collection::Collection;
pub use order::{Attachment, ContractType, Order, PollutantEntry};
pub use user::User;
