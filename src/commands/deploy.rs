// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the orchestrator and turns per-service outcomes into an exit status.

use super::context::{Environment, Project};
use super::report_warnings;
use liftoff::deploy::RolloutStatus;
use liftoff::diagnostics::Diagnostics;
use liftoff::error::{Error, Result};
use liftoff::output::Output;

/// Deploy to all managed services of `environment`.
pub async fn deploy(
    project: &Project,
    environment: &str,
    version: Option<&str>,
    force_rebuild: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let env = Environment::connect(project, environment, &output).await?;
    let orchestrator = env.orchestrator(project, output.clone())?;
    let request = env.request(project, version, force_rebuild);
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} to {} ({})",
        project.application(),
        env.context.name,
        env.context.cluster
    ));

    let result = orchestrator.run(&request, &mut diag).await;
    report_warnings(&diag, &output);
    let result = result?;

    if !result.is_success() {
        for outcome in result.failures() {
            if let RolloutStatus::Failed { ref reason } = outcome.status {
                output.error(&format!("{}: {reason}", outcome.service));
            }
        }
        return Err(Error::RolloutFailed {
            failed: result.failures().count(),
            total: result.outcomes.len(),
        });
    }

    output.success(&format!(
        "Deployed {} to {} service(s)",
        result.artifact(),
        result.outcomes.len()
    ));
    Ok(())
}
