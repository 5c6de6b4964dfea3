//! Club Ledger - Membership and Time-Bank Ledger
//!
//! This crate tracks club memberships, prepaid play minutes and play
//! sessions: starting a session checks membership and balance, ending one
//! bills the elapsed minutes against the member's time bank.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
