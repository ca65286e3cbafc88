//! Outbound email. No HTTP surface of its own; other features hand
//! this module messages to deliver in the background.

pub mod services;
