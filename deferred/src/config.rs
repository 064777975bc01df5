use core::time::Duration;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Settings for building a [`Scope`](crate::Scope).
///
/// With the `serde` feature, durations are written in humantime form, e.g.
/// `deadline = "1500ms"` or `grace_period = "2s"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// How long after creation the scope's token fires. `None` means never.
    #[cfg_attr(feature = "serde", serde(with = "humantime_option"))]
    pub deadline: Option<Duration>,

    /// How long shutdown waits for tasks to finish before reporting a leak.
    #[cfg_attr(feature = "serde", serde(with = "humantime_duration"))]
    pub grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deadline: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

#[cfg(feature = "serde")]
mod humantime_duration {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
mod humantime_option {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.collect_str(&humantime::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_humantime() {
        let config: Config =
            serde_json::from_str(r#"{ "deadline": "1s 500ms", "grace_period": "250ms" }"#)
                .unwrap();
        assert_eq!(config.deadline, Some(Duration::from_millis(1500)));
        assert_eq!(config.grace_period, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "grace_period": "soon" }"#).is_err());
    }

    #[test]
    fn test_serialize_roundtrips_through_text() {
        let config = Config {
            deadline: Some(Duration::from_secs(90)),
            ..Default::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("1m 30s"));
        assert_eq!(serde_json::from_str::<Config>(&text).unwrap(), config);
    }
}
