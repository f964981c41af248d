// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftoff")]
#[command(about = "Build, publish and roll out containerized services on ECS")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Override the application name from liftoff.yml
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Path of the env sample listing required configuration keys
    #[arg(long, global = true)]
    pub env_sample: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new liftoff.yml configuration file
    Init {
        /// Application name
        #[arg(short, long)]
        application: Option<String>,

        /// AWS account that owns the registry and clusters
        #[arg(long)]
        account_id: Option<String>,

        /// Overwrite existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the artifact tag for a version
    GetTag {
        /// Commit, branch or tag to derive the artifact tag from
        #[arg(long)]
        version: Option<String>,
    },

    /// Build the image locally without publishing it
    BuildImage {
        #[arg(long)]
        version: Option<String>,
    },

    /// Push an already built local image to the environment's registry
    PushImage {
        /// Target environment (defined in config)
        #[arg(short, long)]
        environment: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Build and publish the image unless the registry already has it
    Upload {
        #[arg(short, long)]
        environment: String,

        #[arg(long)]
        version: Option<String>,

        /// Rebuild and push even if the tag is already published
        #[arg(short, long)]
        force: bool,

        /// Extra tags to apply to the published image
        #[arg(long = "additional-tag")]
        additional_tags: Vec<String>,
    },

    /// Write the task definition that would be deployed to a JSON file
    TaskDefinition {
        #[arg(short, long)]
        environment: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Deploy a version to every service of an environment
    Deploy {
        #[arg(short, long)]
        environment: String,

        #[arg(long)]
        version: Option<String>,

        /// Rebuild and push the image even if the tag is already published
        #[arg(long)]
        force_rebuild: bool,
    },
}
