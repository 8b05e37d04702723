//! Simulated key input.
//!
//! The choreographer only ever sequences two primitives, press and release,
//! over config-named keys. The SendInput backend is the real device; tests
//! use a recording injector to assert ordering.

#[cfg(windows)]
pub mod sendinput;

use anyhow::Result;

/// Abstract key press/release injection.
///
/// Keys are the names used in [`crate::config::KeyConfig`] ("x", "enter",
/// "up", ...). Implementations own the mapping to actual device codes.
pub trait KeyInjector {
    fn press(&mut self, key: &str) -> Result<()>;
    fn release(&mut self, key: &str) -> Result<()>;
}

#[cfg(windows)]
pub use sendinput::{is_key_down, SendInputInjector};
