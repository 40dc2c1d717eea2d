//! Core forum logic. Each operation takes the store pool and the caller's
//! identity, checks the caller's capability before touching the store, and
//! runs multi-row writes in a single transaction.

pub mod categories;
pub mod comments;
pub mod identity;
pub mod moderator_requests;
pub mod reports;
pub mod threads;
pub mod users;
pub mod votes;
