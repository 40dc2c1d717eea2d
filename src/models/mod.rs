// src/models/mod.rs

pub mod category;
pub mod comment;
pub mod moderator_request;
pub mod report;
pub mod thread;
pub mod user;
pub mod vote;
