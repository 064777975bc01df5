use serde::Deserialize;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid link '{0}', expected '+N', '-N', '*N', 'fail' or 'empty'")]
    BadOp(String),

    #[error("Invalid delay in link '{0}': {1}")]
    BadDelay(String, humantime::DurationError),

    #[error("Link failed as requested")]
    Requested,

    #[error("Arithmetic overflow applying '{op}' to {value}")]
    Overflow { op: Op, value: i64 },
}

/// What a link does to the value it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add(i64),
    Mul(i64),
    Fail,
    Empty,
}

impl Op {
    /// Applies the operation. `Ok(None)` means the link closes without a value.
    pub fn apply(self, value: i64) -> Result<Option<i64>, Error> {
        let result = match self {
            Op::Add(n) => value.checked_add(n),
            Op::Mul(n) => value.checked_mul(n),
            Op::Fail => return Err(Error::Requested),
            Op::Empty => return Ok(None),
        };
        result
            .map(Some)
            .ok_or(Error::Overflow { op: self, value })
    }
}

impl core::fmt::Display for Op {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Op::Add(n) if *n < 0 => write!(f, "{n}"),
            Op::Add(n) => write!(f, "+{n}"),
            Op::Mul(n) => write!(f, "*{n}"),
            Op::Fail => f.write_str("fail"),
            Op::Empty => f.write_str("empty"),
        }
    }
}

/// One link of a chain: an operation, optionally performed after a delay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Step {
    pub op: Op,
    pub delay: Option<Duration>,
}

impl core::fmt::Display for Step {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.delay {
            Some(delay) => write!(f, "{}@{}", self.op, humantime::format_duration(delay)),
            None => write!(f, "{}", self.op),
        }
    }
}

impl core::str::FromStr for Step {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (op, delay) = match s.split_once('@') {
            Some((op, delay)) => (
                op.trim(),
                Some(
                    humantime::parse_duration(delay.trim())
                        .map_err(|e| Error::BadDelay(s.to_string(), e))?,
                ),
            ),
            None => (s, None),
        };

        let number = |n: &str| n.parse::<i64>().map_err(|_| Error::BadOp(s.to_string()));
        let op = match op {
            "fail" => Op::Fail,
            "empty" => Op::Empty,
            _ if op.starts_with('+') => Op::Add(number(&op[1..])?),
            _ if op.starts_with('-') => Op::Add(number(op)?),
            _ if op.starts_with('*') => Op::Mul(number(&op[1..])?),
            _ => return Err(Error::BadOp(s.to_string())),
        };
        Ok(Self { op, delay })
    }
}

impl TryFrom<String> for Step {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let step: Step = "+3".parse().unwrap();
        assert_eq!(step, Step { op: Op::Add(3), delay: None });

        let step: Step = "-2".parse().unwrap();
        assert_eq!(step.op, Op::Add(-2));

        let step: Step = "*4 @ 1s 500ms".parse().unwrap();
        assert_eq!(step.op, Op::Mul(4));
        assert_eq!(step.delay, Some(Duration::from_millis(1500)));

        assert_eq!("fail".parse::<Step>().unwrap().op, Op::Fail);
        assert_eq!("empty@2s".parse::<Step>().unwrap().op, Op::Empty);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("/2".parse::<Step>(), Err(Error::BadOp(_))));
        assert!(matches!("+x".parse::<Step>(), Err(Error::BadOp(_))));
        assert!(matches!("+1@soon".parse::<Step>(), Err(Error::BadDelay(..))));
    }

    #[test]
    fn test_display_parses_back() {
        for text in ["+3", "-7", "*2@250ms", "fail", "empty@1s"] {
            let step: Step = text.parse().unwrap();
            assert_eq!(step.to_string().parse::<Step>().unwrap(), step);
        }
    }

    #[test]
    fn test_apply() {
        assert_eq!(Op::Add(2).apply(40).unwrap(), Some(42));
        assert_eq!(Op::Mul(-3).apply(5).unwrap(), Some(-15));
        assert_eq!(Op::Empty.apply(1).unwrap(), None);
        assert!(matches!(Op::Fail.apply(1), Err(Error::Requested)));
        assert!(matches!(
            Op::Mul(2).apply(i64::MAX),
            Err(Error::Overflow { .. })
        ));
    }
}
