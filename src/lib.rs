//! # git-rehead
//!
//! Edits the messages, authors and committers of the commits reachable from
//! HEAD, then rewrites the history in one pass.
//!
//! ## Features
//!
//! - Per-commit edits kept in memory until applied
//! - Committer fields that follow the author until edited apart
//! - Reloads that carry pending edits over to the fresh history
//! - A single rewrite that moves branches and backs them up under `refs/original/`
//!
//! ## Quick Start
//!
//! ```no_run
//! use git_rehead::session::Session;
//!
//! let mut session = Session::open(".")?;
//! if let Some(hash) = session.snapshot().records().first().map(|r| r.hash().to_string()) {
//!     if let Some(record) = session.snapshot_mut().find_mut(&hash) {
//!         record.set_message("Reworded\n");
//!     }
//! }
//! session.apply()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod data;
pub mod git;
pub mod session;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of git-rehead.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
