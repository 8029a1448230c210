//! Planets CMS CLI Library
//!
//! Synchronizes a set of sample planet records with a remote CMS: creates,
//! updates, deletes and prints instances of the `un_planet` type.
//!
//! # Modules
//!
//! - `cli` - Command implementations behind the binary's subcommands
//! - `cms` - Authenticated client for the CMS instance API
//! - `config` - Environment configuration and `.env` loading
//! - `error` - Error types shared by all layers
//! - `http` - HTTP request helper with retry and backoff
//! - `logger` - Timestamped, color-coded console logging
//! - `management` - Access token cache
//! - `planets` - Planet workflows and data mapping
//! - `types` - Data structures and type definitions
//!
//! # Example
//!
//! ```
//! use planets::{cms::InstanceClient, config::CmsConfig, planets::planet_info};
//!
//! #[tokio::main]
//! async fn main() -> planets::Res<()> {
//!     planets::config::load_env()?;
//!     let client = InstanceClient::from_config(&CmsConfig::from_env()?)?;
//!     planet_info(&client).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cms;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod management;
pub mod planets;
pub mod types;

pub use error::{Error, Res};

/// Logs a message at INFO level.
///
/// Accepts the same arguments as `println!`. The line is prefixed with the
/// current UTC time and the file and line of the call site.
///
/// # Example
///
/// ```
/// info!("Fetching access token");
/// info!("Found {} instances", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    $crate::logger::log($crate::logger::Level::Info, file!(), line!(), std::format_args!($($arg)*));
  })
}

/// Logs a success message at INFO level, marked with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    $crate::logger::log(
      $crate::logger::Level::Info,
      file!(),
      line!(),
      std::format_args!("{} {}", "✓".green().bold(), std::format_args!($($arg)*)),
    );
  })
}

/// Logs a message at WARN level.
///
/// Used for recoverable issues the operator should notice, such as a retried
/// request.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    $crate::logger::log($crate::logger::Level::Warn, file!(), line!(), std::format_args!($($arg)*));
  })
}

/// Logs a message at ERROR level.
///
/// Unlike a panic this does not stop the program; callers still return the
/// error to their own caller.
///
/// # Example
///
/// ```
/// error!("Unable to delete item with id {}", id);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    $crate::logger::log($crate::logger::Level::Error, file!(), line!(), std::format_args!($($arg)*));
  })
}
