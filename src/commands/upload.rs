// ABOUTME: Upload command implementation.
// ABOUTME: Ensures the image is published, then applies any additional tags.

use super::context::{Environment, Project};
use super::report_warnings;
use liftoff::diagnostics::Diagnostics;
use liftoff::error::{Error, Result};
use liftoff::output::Output;
use liftoff::types::ArtifactTag;

pub struct UploadOptions {
    pub version: Option<String>,
    pub force: bool,
    pub additional_tags: Vec<String>,
}

pub async fn upload(
    project: &Project,
    environment: &str,
    options: UploadOptions,
    mut output: Output,
) -> Result<()> {
    output.start_timer();

    // Reject bad tags before anything is built.
    let extra = options
        .additional_tags
        .iter()
        .map(|t| ArtifactTag::parse(t).map_err(|e| Error::InvalidConfig(e.to_string())))
        .collect::<Result<Vec<_>>>()?;

    let resolved = project
        .versions()?
        .resolve(options.version.as_deref())
        .await?;
    let env = Environment::connect(project, environment, &output).await?;
    let uploader = env.uploader(project);
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Ensuring {} is in {} ...",
        resolved.tag(),
        uploader.publisher().location().repository_uri()
    ));
    let outcome = uploader
        .ensure_published(&resolved, options.force, &mut diag)
        .await;
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            report_warnings(&diag, &output);
            return Err(e.into());
        }
    };

    if !extra.is_empty() {
        let applied = uploader.add_tags(resolved.tag(), &extra, &mut diag).await;
        output.progress(&format!("Applied {applied} of {} additional tag(s)", extra.len()));
    }

    report_warnings(&diag, &output);
    if outcome.was_built() {
        output.success(&format!("Published {}", outcome.reference()));
    } else {
        output.success(&format!("Already published: {}", outcome.reference()));
    }
    Ok(())
}
