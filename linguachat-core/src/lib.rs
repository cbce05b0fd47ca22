//! linguachat-core: client side of the language-learning chat.
//!
//! Holds everything that does not touch the terminal: the wire types and
//! HTTP client for the conversation backend, the per-run [`session::Session`]
//! and the controller operations that mutate it, declarative views with an
//! HTML renderer, the theme preference, local speech fallback, and config.

pub mod api;
pub mod config;
pub mod controller;
pub mod markup;
pub mod messages;
pub mod session;
pub mod speech;
pub mod theme;
pub mod types;
pub mod view;
