//! CLI module for the oval-annotate tool
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{
    failed_preview, main, run_extract, Cli, Command, ExtractArgs, ExtractReport, InspectArgs,
};
