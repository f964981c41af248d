// ABOUTME: Tag, build and push commands for working with a single image.
// ABOUTME: Each step of the upload pipeline, exposed on its own.

use super::context::{Environment, Project};
use liftoff::error::Result;
use liftoff::output::Output;

/// Print the artifact tag the current tree (or `version`) resolves to.
pub async fn get_tag(project: &Project, version: Option<&str>, output: &Output) -> Result<()> {
    let resolved = project.versions()?.resolve(version).await?;
    output.result(resolved.tag().as_str());
    Ok(())
}

pub async fn build_image(project: &Project, version: Option<&str>, mut output: Output) -> Result<()> {
    output.start_timer();
    let resolved = project.versions()?.resolve(version).await?;

    output.progress(&format!("Building {} ...", resolved.tag()));
    let image = project
        .image_builder()
        .build(resolved.tag(), resolved.reference.as_deref(), &project.dir)
        .await?;

    output.success(&format!("Built {image}"));
    Ok(())
}

/// Push an image produced by `build-image`; nothing is rebuilt.
pub async fn push_image(
    project: &Project,
    environment: &str,
    version: Option<&str>,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let resolved = project.versions()?.resolve(version).await?;
    let env = Environment::connect(project, environment, &output).await?;

    let publisher = env.publisher(project);
    let local = project.image_builder().local_image(resolved.tag());
    let remote = publisher.location().reference(resolved.tag().clone());

    publisher.ensure_repository().await?;
    publisher.authenticate().await?;
    output.progress(&format!("Pushing {local} to {remote} ..."));
    publisher.publish(&local, &remote).await?;

    output.success(&format!("Pushed {remote}"));
    Ok(())
}
