#![forbid(unsafe_code)]

use clap::Parser;
use tinproxy::{FailurePolicy, RegistryConfig};
use tracing_subscriber::EnvFilter;

mod demos;

/// Run one of the interception demos by name.
#[derive(Debug, Parser)]
#[command(name = "tinproxy", version)]
struct Cli {
    /// Demo to run: noop, logging, fn-trap (fnTrap), validation, read-only
    /// (readOnly), reactivity
    name: Option<String>,

    /// Maximum nesting of notification rounds
    #[arg(long, env = "TINPROXY_MAX_DEPTH", default_value_t = RegistryConfig::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum notification rounds one write may start, nested rounds included
    #[arg(long, env = "TINPROXY_MAX_ROUNDS", default_value_t = RegistryConfig::DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Stop a notification round at the first failing effect
    #[arg(long)]
    abort_on_failure: bool,
}

impl Cli {
    fn registry_config(&self) -> RegistryConfig {
        let policy = if self.abort_on_failure {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        };
        RegistryConfig::new()
            .max_depth(self.max_depth)
            .max_rounds(self.max_rounds)
            .failure_policy(policy)
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let name = cli.name.clone().unwrap_or_default();

    let Some(demo) = demos::lookup(&name) else {
        eprintln!("\"{name}\" is not a registered demo");
        std::process::exit(1);
    };

    if let Err(error) = demo(cli.registry_config()) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
