/// Spawns a task on a pool, with a detached trace span when the calling crate
/// enables its `instrument` feature.
///
/// The span has no parent, so a long-lived task does not keep its creator's
/// span open, but it records a `follows_from` link to it.
///
/// # Syntax
///
/// ```text
/// // Simple case (no fields):
/// relay_async::spawn!(pool, "task_name", async { ... })
///
/// // Complex case (with span fields - use parentheses):
/// relay_async::spawn!(pool, "task_name", (?field1, field2 = value), async { ... })
/// ```
#[macro_export]
macro_rules! spawn {
    // Simple case: just task name and future (no fields)
    ($pool:expr, $name:literal, async $($rest:tt)*) => {{
        #[cfg(feature = "instrument")]
        {
            let task = async $($rest)*;
            let span = tracing::trace_span!(parent: None, $name);
            span.follows_from(tracing::Span::current());
            $pool.spawn(tracing::Instrument::instrument(task, span))
        }
        #[cfg(not(feature = "instrument"))]
        {
            $pool.spawn(async $($rest)*)
        }
    }};

    // Complex case: span fields wrapped in parentheses before the future
    ($pool:expr, $name:literal, ($($field:tt)*), async $($rest:tt)*) => {{
        #[cfg(feature = "instrument")]
        {
            let task = async $($rest)*;
            let span = tracing::trace_span!(parent: None, $name, $($field)*);
            span.follows_from(tracing::Span::current());
            $pool.spawn(tracing::Instrument::instrument(task, span))
        }
        #[cfg(not(feature = "instrument"))]
        {
            $pool.spawn(async $($rest)*)
        }
    }};
}
