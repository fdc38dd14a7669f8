// src/scripts/mod.rs
pub mod init;
pub mod report;
pub mod status;
