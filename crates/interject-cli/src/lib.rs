//! Command-line interface for Interject registries.
//!
//! # Key Abstractions
//!
//! - [`InterjectCli`]: loads the registry config and dispatches commands
//! - [`CliArgs`]: clap argument definitions
//! - [`demo`]: a sample intercepted service graph

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config_handlers;
pub mod demo;

pub use app::InterjectCli;
pub use cli::{BaseCommand, CliArgs, ConfigAction, ConfigCommand};
