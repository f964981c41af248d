// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates liftoff.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ApplicationName;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(
    dir: &Path,
    application: Option<&str>,
    account_id: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(name) = application {
        config.application =
            ApplicationName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let account_id = account_id.unwrap_or("123456789012");
    let yaml = generate_template_yaml(&config, account_id);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config, account_id: &str) -> String {
    format!(
        r#"application: {}
account_id: "{}"
# Identity used in tags built from a dirty tree (default: $USER)
# operator: alice
env_sample: {}

source:
  # Treat untracked files as uncommitted changes
  include_untracked: true

rollout:
  poll_interval: 5s
  timeout: 20m

environments:
  staging:
    region: us-east-1
    # cluster: cluster-staging
"#,
        config.application,
        account_id,
        config.env_sample.display(),
    )
}
