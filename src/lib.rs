//! Run a project's scripts inside its Docker images, locally or on a remote
//! host staged over SSH.

pub mod config;
pub mod console;
pub mod docker;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod remote;
pub mod shell;

pub use error::BwdError;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let default = if verbose { "debug" } else { "info" };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(fmt_layer)
        .init();
}
