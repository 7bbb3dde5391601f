//! Colorbook - Google sign-in and coloring page generation
//!
//! This library provides an OAuth2 session manager with lazily refreshed
//! access tokens and an Imagen client that turns a short description into a
//! black-and-white coloring page.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod generation;
pub mod storage;
pub mod ui;

pub use app::AppContext;
pub use error::{Error, Result};
