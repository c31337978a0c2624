pub mod error;
pub mod format;
pub mod logging;

pub use error::{AppError, AppResult};
pub use format::format_report_text;
pub use logging::init_logging;
