// ABOUTME: Task definition export command.
// ABOUTME: Writes the filtered descriptor of the first service to a JSON file.

use super::context::{Environment, Project};
use super::report_warnings;
use liftoff::descriptor::export_filename;
use liftoff::diagnostics::Diagnostics;
use liftoff::error::Result;
use liftoff::output::Output;

pub async fn task_definition(
    project: &Project,
    environment: &str,
    version: Option<&str>,
    output: Output,
) -> Result<()> {
    let env = Environment::connect(project, environment, &output).await?;
    let orchestrator = env.orchestrator(project, output.clone())?;
    let request = env.request(project, version, false);
    let mut diag = Diagnostics::default();

    let descriptor = orchestrator
        .generate_descriptor_only(&request, &mut diag)
        .await;
    report_warnings(&diag, &output);
    let descriptor = descriptor?;

    let path = project.dir.join(export_filename(version));
    let document = descriptor.export_document()?;
    std::fs::write(&path, serde_json::to_string_pretty(&document)?)?;

    output.result(&path.display().to_string());
    Ok(())
}
