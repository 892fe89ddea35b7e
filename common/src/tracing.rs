use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, PartialEq)]
pub enum Stream {
    Stderr,
    Stdout,
}

pub struct TracingConfig {
    pub stream: Stream,
    pub directives: Vec<tracing_subscriber::filter::Directive>,
}

pub fn create_tracing_subscriber(
    tracing_config: TracingConfig,
    log_level: tracing_subscriber::filter::LevelFilter,
) -> impl tracing::Subscriber {
    let env_filter_layer = tracing_subscriber::EnvFilter::builder()
        // Set the default log level to 'info'
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let env_filter_layer = tracing_config
        .directives
        .into_iter()
        .fold(env_filter_layer, |env_filter_layer, directive| {
            env_filter_layer.add_directive(directive)
        });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_file(true)
        .with_line_number(false);
    let fmt_layer = if tracing_config.stream == Stream::Stderr {
        fmt_layer.with_writer(std::io::stderr).boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter_layer)
        .with(fmt_layer)
}
