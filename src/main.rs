mod client;
mod error;
mod views;

use clap::Parser;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;

use client::Client;
use client::Color;
use client::Commands;

#[tokio::main]
async fn main() {
    let client = Client::parse();

    match &client.color {
        Color::Never => colored::control::set_override(false),
        Color::Always => colored::control::set_override(true),
        Color::Auto => {}
    }

    let tracing_config = TracingConfig {
        stream: Stream::Stderr,
        directives: vec![],
    };
    let subscriber = create_tracing_subscriber(
        tracing_config,
        tracing_subscriber::filter::LevelFilter::INFO,
    );
    tracing::subscriber::set_global_default(subscriber)
        .expect("the tracing subscriber should install");

    if let Err(error) = run(client).await {
        tracing::error!(%error, "fatal error");
        std::process::exit(1);
    }
}

async fn run(client: Client) -> anyhow::Result<()> {
    let Client {
        storage_config,
        app_version,
        command,
        ..
    } = client;

    match command {
        Commands::Runserver(args) => {
            client::runserver::runserver(args, storage_config, app_version).await
        }
        Commands::Openapi => {
            client::print_openapi();
            Ok(())
        }
        Commands::Healthcheck => client::healthcheck::healthcheck_cmd(storage_config).await,
    }
}
