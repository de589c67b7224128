//! Driver for ESP8266 Wi-Fi modules running the AT command firmware.
//!
//! The module is attached over a serial line. Commands are written as
//! `\r\n` terminated lines and answered by an echo of the command, any
//! number of informational lines and a final status line (`OK`, `ERROR` or
//! `FAIL`). Replies can take anything from a few milliseconds to many
//! seconds, and some commands only send `OK` long after their output.
//!
//! [`Client`] owns the serial [`Transport`] and a [`Clock`], and runs one
//! command at a time through a bounded two phase wait. The [`system`],
//! [`wifi`] and [`ip`] modules map the module's commands onto typed
//! functions on top of it.
//!
//! ```ignore
//! use esp_at::{wifi, Client, Config, SerialTransport, SystemClock};
//!
//! let mut client = Client::new(SerialTransport::new(serial), SystemClock, Config::new());
//!
//! wifi::set_mode(&mut client, wifi::WifiMode::Station)?;
//! wifi::connect(&mut client, "my-network", "secret-psk")?;
//! for ap in wifi::list_all_access_points(&mut client)? {
//!     // ...
//! }
//! ```
//!
//! # Optional Cargo Features
//!
//! - **`log`** *(enabled by default)*: Logs every line sent and received,
//!   with the time elapsed since the command was written, through the
//!   [`log`](https://crates.io/crates/log) facade.
//! - **`defmt`** *(disabled by default)*: Same, through `defmt`. Cannot be
//!   combined with `log`.
//! - **`std`** *(disabled by default)*: Hosted targets: `std::error::Error`
//!   for [`Error`] and a sleeping [`SystemClock`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod client;
pub mod command;
pub mod commands;
mod config;
mod error;
mod helpers;
pub mod ip;
mod parser;
pub mod response;
pub mod system;
mod timer;
mod transport;
pub mod wifi;

#[cfg(test)]
mod mock;

pub use self::client::Client;
pub use self::command::{join_args, Arg, Invocation, Kind};
pub use self::config::{Config, OkCutoff};
pub use self::error::{CommandError, Error, Failure};
pub use self::helpers::LossyStr;
pub use self::response::{Line, Lines, Terminals};
pub use self::timer::{Clock, SystemClock, Ticker};
pub use self::transport::{SerialTransport, Transport};
