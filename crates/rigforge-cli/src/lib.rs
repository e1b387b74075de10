//! Rigforge CLI library.
//!
//! This crate provides the core functionality for the Rigforge CLI,
//! including request loading, rig synthesis commands, and report output.

pub mod commands;
pub mod input;
pub mod report;
