pub mod chrome_finder;
pub mod error;
pub mod launcher;
pub mod probe;
pub mod profile;
pub mod session;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::ChromeLauncher;
pub use probe::PageProbe;
pub use profile::ProfileManager;
pub use session::BrowserSession;
