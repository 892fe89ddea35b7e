pub mod healthcheck;
pub mod runserver;

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use utoipa::OpenApi as _;

use runserver::RunserverArgs;

use crate::views::ApiDoc;

#[derive(Parser, Debug)]
#[command(author, version)]
pub struct Client {
    #[command(flatten)]
    pub storage_config: StorageConfig,
    #[arg(long, env, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    /// Service version (reported by /version, always provide in production)
    #[clap(long, env = "DOCSTORE_GIT_DESCRIBE")]
    pub app_version: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the document content blobs
    #[arg(long, env = "DOCSTORE_STORAGE_ROOT", default_value = "./documents")]
    pub storage_root: PathBuf,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum Color {
    Never,
    Always,
    #[default]
    Auto,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Runserver(RunserverArgs),
    #[command(about, long_about = "Prints the OpenApi of the service")]
    Openapi,
    #[command(about, long_about = "Healthcheck")]
    Healthcheck,
}

/// Prints the OpenApi to stdout
pub fn print_openapi() {
    let openapi = ApiDoc::openapi();
    print!("{}", serde_yaml::to_string(&openapi).unwrap());
}
