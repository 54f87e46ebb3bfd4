//! Personalized game ranking: TF-IDF catalog search plus a multi-factor
//! recommendation scorer with online preference learning.
//!
//! The crate is the core of a recommendation backend; HTTP routing,
//! authentication, schema migrations and external profile sync live in the
//! surrounding services and talk to this crate through the store traits in
//! [`db`] and the boundary operations in [`services`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod search;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
