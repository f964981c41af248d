// ABOUTME: Command module aggregator for the liftoff CLI.
// ABOUTME: Re-exports image, upload, task definition and deploy command handlers.

mod context;
mod deploy;
mod image;
mod task_definition;
mod upload;

pub use context::Project;
pub use deploy::deploy;
pub use image::{build_image, get_tag, push_image};
pub use task_definition::task_definition;
pub use upload::{UploadOptions, upload};

use liftoff::diagnostics::Diagnostics;
use liftoff::output::Output;

/// Emit collected warnings.
fn report_warnings(diag: &Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
