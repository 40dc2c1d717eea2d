// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod community;
pub mod interaction;
pub mod moderation;
pub mod profile;
