pub mod console;
pub mod error;
pub mod multi;
pub mod render;
pub mod telegram;

pub use self::console::ConsoleReporter;
pub use error::{Error, Result};
pub use multi::MultiReporter;
pub use telegram::TelegramReporter;
