//! Query modules for each table.

pub mod folders;
pub mod mails;
pub mod settings;
