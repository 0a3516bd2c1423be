// Adapters layer: concrete implementations of the domain ports (search API, notification channels).

pub mod amadeus;
pub mod console;
pub mod telegram;

pub use amadeus::AmadeusProvider;
pub use console::ConsoleNotifier;
pub use telegram::TelegramNotifier;
