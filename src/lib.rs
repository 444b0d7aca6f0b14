//! Kitobxona - Telegram bot serving a library of PDF and audio books
//!
//! This library provides all the core functionality for the Kitobxona bot:
//! the hierarchical book catalog, admin role management, multi-step admin
//! dialogs and the Telegram handler tree.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging and formatting helpers
//! - `storage`: Database access, migrations and usage counters
//! - `access`: Role resolution for incoming updates
//! - `session`: In-memory dialog sessions
//! - `workflow`: The multi-step dialog state machines
//! - `telegram`: Telegram bot integration and handlers

pub mod access;
pub mod core;
pub mod i18n;
pub mod session;
pub mod storage;
pub mod telegram;
pub mod workflow;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use session::SessionStore;
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
pub use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
