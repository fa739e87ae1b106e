//! Cloud drive FUSE filesystem
//!
//! Exposes a remote cloud drive as a POSIX-like filesystem. The core in
//! [`fuse`] works against the [`remote::RemoteDrive`] interface; the
//! Microsoft Graph binding lives in [`remote::graph_drive`].

pub mod auth;
pub mod config;
pub mod error;
pub mod fuse;
pub mod log_appender;
pub mod remote;
