//! Business logic and port definitions for SocialDesk.
//!
//! This crate defines the "ports" (repository traits, platform publisher,
//! AI generator, media storage) that the infrastructure layer implements,
//! plus the services that enforce post lifecycle, inbox, and publishing
//! rules. It depends only on `socialdesk-types` -- never on
//! `socialdesk-infra` or any database/HTTP crate.

pub mod ai;
pub mod platform;
pub mod repository;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
