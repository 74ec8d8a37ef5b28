//! Command implementations.

mod config;
mod init;
mod new;
mod publish;
mod unpublish;

pub use config::config;
pub use init::init;
pub use new::new_note;
pub use publish::publish;
pub use unpublish::unpublish;

use std::path::Path;

/// Home-relative display form of a path.
pub(crate) fn tildify(path: &Path) -> String {
    let display = path.display().to_string();
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() && display.starts_with(&home) => {
            format!("~{}", &display[home.len()..])
        }
        _ => display,
    }
}
