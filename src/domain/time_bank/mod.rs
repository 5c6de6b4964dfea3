//! Time-bank domain module.

mod account;

pub use account::{
    credit_amount, DebitClamped, DebitOutcome, TimeBankAccount, TimeBankBalance,
    MAX_CREDIT_MINUTES,
};
