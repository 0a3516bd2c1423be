pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{AmadeusProvider, ConsoleNotifier, TelegramNotifier};
pub use config::FareConfig;
pub use core::{engine::FareEngine, pipeline::FarePipeline};
pub use utils::error::{FareError, Result};
