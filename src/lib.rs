//! # rusty-drive
//!
//! A Google Drive MCP (Model Context Protocol) server written in Rust.
//!
//! ## Features
//!
//! - Read any Drive file by URL or ID; Google Docs, Sheets, Slides and Apps
//!   Script files are exported server-side to a plain format first
//! - Normalizes Docs exports into sectioned JSON and Sheets exports into
//!   row-oriented JSON
//! - Overwrites file content via resumable upload
//! - Service-account authentication with a production/development mode switch
//!
//! ## Usage
//!
//! ```bash
//! # Start MCP server (for AI assistants)
//! rusty-drive mcp
//!
//! # Fetch a file directly
//! rusty-drive get "https://docs.google.com/document/d/FILE_ID/edit"
//!
//! # Overwrite a file
//! rusty-drive update FILE_ID "new content"
//!
//! # Check credentials
//! rusty-drive validate
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod normalize;
pub mod service;

pub use config::Config;
pub use error::{DriveError, Result};
pub use gateway::DriveGateway;
pub use service::DriveService;
