//! # rtf - Allocation state for Vagrant test platforms
//!
//! This library keeps the persistent allocation state of a set of declared
//! platforms: named groups of virtual hosts described by JSON definitions.
//! Each platform gets a unique private /24 subnet, each host a unique IP in
//! it, and each server host a pair of forwarded HTTP/HTTPS ports unique
//! across all platforms.
//!
//! ## Overview
//!
//! Once a resource has been assigned it never moves. Re-running an update
//! with changed definitions keeps every existing `subnet`, `ip` and port,
//! and a run on an already complete state changes nothing.
//!
//! ## Architecture
//!
//! - `ip`: next free subnet, host address and port
//! - `platform`: loading of `platforms/<name>.json` definitions
//! - `state`: state types, deep merge, state file, and the store driving
//!   update / reconcile / remove
//! - `manifest`: notifier regenerating the Vagrantfile after each write
//! - `config`: tool settings from `rtf.yaml`
//! - `utils`: comment stripping and state consistency checks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rtf::manifest::VagrantfileNotifier;
//! use rtf::platform::PlatformLoader;
//! use rtf::state::{StateFile, StateStore};
//!
//! let mut store = StateStore::new(
//!     StateFile::new(".rtfstate"),
//!     PlatformLoader::new("platforms"),
//!     VagrantfileNotifier::new("Vagrantfile.jinja", "Vagrantfile"),
//! );
//!
//! let report = store.update(["demo"])?;
//! for assignment in &report.assignments {
//!     println!("{}", assignment);
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Platform Format
//!
//! ```text
//! {
//!   "default": { "system": "debian12", "rudder-setup": "agent" },
//!   "server":  { "rudder-setup": "server" },  // gets http/https ports
//!   "agent1":  {}
//! }
//! ```
//!
//! ## Error Handling
//!
//! Domain errors are `thiserror` enums; operations return
//! `color_eyre::Result` with context attached.

pub mod config;
pub mod ip;
pub mod manifest;
pub mod platform;
pub mod state;
pub mod utils;
