//! Social platform ports.
//!
//! `SocialPublisher` is implemented by the Meta Graph API client in
//! socialdesk-infra. `poll` holds the bounded status poller used while a
//! media container is processed remotely.

pub mod poll;
pub mod publisher;
