//! unimail - local-first mailbox engine for a self-hosted webmail client
//!
//! This crate provides the mail sync and mailbox state core: pulling
//! recent mail from an IMAP inbox into a local SQLite store, folder and
//! flag management over that store, and SMTP submission for outgoing
//! mail. The local store is the single source of truth for reads; sync
//! is pull-only and additive.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;
pub mod text;
