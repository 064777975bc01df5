use super::*;
use serde::Deserialize;

/// Everything needed to run one chain.
///
/// Loaded from the optional configuration file and `RELAY_` environment
/// variables, then overridden by anything given on the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub log_level: Option<String>,

    pub start: i64,

    pub links: Vec<step::Step>,

    #[serde(flatten)]
    pub scope: relay_deferred::config::Config,

    #[serde(skip)]
    pub until: Option<time::OffsetDateTime>,
}

impl Plan {
    pub fn load(args: &Command) -> anyhow::Result<Self> {
        let mut b = config::Config::builder();

        if let Some(path) = &args.config {
            b = b.add_source(config::File::from(path.as_path()));
        }

        // Pull in environment vars
        b = b.add_source(config::Environment::with_prefix("RELAY"));

        let mut plan: Plan = b
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration: {e}"))?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration: {e}"))?;

        plan.apply_args(args)?;
        Ok(plan)
    }

    fn apply_args(&mut self, args: &Command) -> anyhow::Result<()> {
        if let Some(start) = args.start {
            self.start = start;
        }
        if !args.links.is_empty() {
            self.links = args.links.clone();
        }
        if let Some(deadline) = args.deadline {
            self.scope.deadline = Some(deadline.into());
        }
        if let Some(grace) = args.grace {
            self.scope.grace_period = grace.into();
        }
        if let Some(until) = &args.until {
            self.until = Some(
                time::OffsetDateTime::parse(until, &time::format_description::well_known::Rfc3339)
                    .map_err(|e| anyhow::anyhow!("Invalid --until time '{until}': {e}"))?,
            );
            self.scope.deadline = None;
        }
        if self.links.is_empty() {
            return Err(anyhow::anyhow!(
                "No links to run, pass some on the command line or in a configuration file"
            ));
        }
        Ok(())
    }
}
