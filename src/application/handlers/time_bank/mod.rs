//! Time-bank command and query handlers.

mod credit_time;
mod get_time_bank;

pub use credit_time::{CreditTimeCommand, CreditTimeHandler, CreditTimeResult};
pub use get_time_bank::{GetTimeBankHandler, GetTimeBankQuery};
