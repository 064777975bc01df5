use super::*;
use std::path::PathBuf;

mod cancel;
mod exec;
mod plan;
mod step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Verbosity {
    /// Designates very low priority, often extremely verbose, information.
    #[value(name = "trace")]
    Trace,

    /// Designates lower priority information.
    #[value(name = "debug")]
    Debug,

    /// Designates useful information.
    #[value(name = "info")]
    Info,

    /// Designates hazardous situations.
    #[value(name = "warn")]
    Warn,

    /// Designates very serious errors.
    #[value(name = "error")]
    Error,
}

impl From<Verbosity> for tracing::Level {
    fn from(value: Verbosity) -> Self {
        match value {
            Verbosity::Trace => tracing::Level::TRACE,
            Verbosity::Debug => tracing::Level::DEBUG,
            Verbosity::Info => tracing::Level::INFO,
            Verbosity::Warn => tracing::Level::WARN,
            Verbosity::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
pub struct Command {
    /// Output additional information, default 'info'.
    #[arg(short, long, num_args = 0..=1, require_equals = true, default_missing_value = "info")]
    verbose: Option<Verbosity>,

    /// A configuration file describing the chain (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The value the chain starts from
    #[arg(short, long, allow_negative_numbers = true)]
    start: Option<i64>,

    /// Cancel the chain after this long, e.g. '1s' or '250ms'
    #[arg(short, long)]
    deadline: Option<humantime::Duration>,

    /// Cancel the chain at this RFC 3339 wall-clock time
    #[arg(long, conflicts_with = "deadline")]
    until: Option<String>,

    /// How long to wait for links to stop after the chain is read
    #[arg(short, long)]
    grace: Option<humantime::Duration>,

    /// The links of the chain, applied in order: '+N', '-N', '*N', 'fail' or
    /// 'empty', optionally followed by '@DELAY', e.g. '*2@500ms'
    #[arg(allow_hyphen_values = true)]
    links: Vec<step::Step>,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let plan = plan::Plan::load(&self)?;

        let level = match self.verbose {
            Some(verbosity) => Some(tracing::Level::from(verbosity)),
            None => plan
                .log_level
                .as_deref()
                .map(str::parse::<tracing::Level>)
                .transpose()
                .map_err(|e| anyhow::anyhow!("Invalid 'log_level' in configuration: {e}"))?,
        };
        if let Some(level) = level {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(level > tracing::Level::INFO)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {e}"))?;
        }

        exec::exec(plan)
    }
}
