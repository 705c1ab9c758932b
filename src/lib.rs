// lib.rs
#![warn(clippy::large_futures)]

pub use tokio::{
    sync::watch,
    time::{sleep, Duration},
};

mod config;
pub use config::*;

mod units;
pub use units::*;

mod max6675;
pub use max6675::*;

mod retry;
pub use retry::*;

mod link;
pub use link::*;

mod acquire;
pub use acquire::*;

#[cfg(target_os = "espidf")]
mod wifi;
#[cfg(target_os = "espidf")]
pub use wifi::*;

#[cfg(target_os = "espidf")]
mod mqtt;
#[cfg(target_os = "espidf")]
pub use mqtt::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

// EOF
