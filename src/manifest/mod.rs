//! Downstream manifest generation.
//!
//! After every successful state write the state store hands the full,
//! sorted list of platform names to a [`Notifier`]. The default notifier
//! regenerates the Vagrantfile that declares one `platform(...)` block per
//! platform.

pub mod vagrantfile;

use color_eyre::Result;

pub use vagrantfile::{parse_declared_platforms, VagrantfileNotifier};

/// Receives the platform names after each persisted write
pub trait Notifier {
    fn notify(&mut self, platforms: &[String]) -> Result<()>;
}
