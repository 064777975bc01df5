use super::*;
use relay_deferred::{DeferredValue, Scope, resolve};
use std::sync::Arc;
use tracing::{debug, info};

/// Appends `step` to the chain ending in `source`.
fn link(
    scope: &Arc<Scope>,
    index: usize,
    source: DeferredValue<i64>,
    step: step::Step,
) -> DeferredValue<i64> {
    let inner_scope = scope.clone();
    scope.try_compose(source, move |value| -> Result<_, step::Error> {
        let result = step.op.apply(value)?;
        debug!(index, %step, value, ?result, "Applying link");

        Ok(match (result, step.delay) {
            (None, _) => DeferredValue::empty(),
            (Some(result), None) => resolve(result),
            (Some(result), Some(delay)) => inner_scope.spawn(async move {
                tokio::time::sleep(delay).await;
                result
            }),
        })
    })
}

/// Builds the scope for `plan`, with `--until` taking the place of any
/// configured deadline.
fn scope_for(plan: &plan::Plan) -> Scope {
    match plan.until {
        Some(until) => {
            let (token, _) = relay_deferred::with_deadline_at(until);
            Scope::with_config(token, &plan.scope)
        }
        None => Scope::from_config(&plan.scope),
    }
}

async fn exec_async(plan: plan::Plan) -> anyhow::Result<()> {
    relay_deferred::describe_metrics();

    let scope = Arc::new(scope_for(&plan));
    cancel::listen_for_cancel(scope.token());

    if let Some(remaining) = scope.token().remaining() {
        info!("Chain will be cancelled in {}", humantime::format_duration(remaining));
    }

    let started = relay_async::time::Instant::now();
    let chain = plan
        .links
        .iter()
        .enumerate()
        .fold(resolve(plan.start), |source, (index, step)| {
            link(&scope, index, source, step.clone())
        });

    match chain.await {
        Some(value) => println!("{} => {value}", plan.start),
        None if scope.token().is_cancelled() => println!("{} => cancelled", plan.start),
        None => println!("{} => no value", plan.start),
    }
    let elapsed = started.elapsed();

    scope.shutdown().await?;

    println!(
        "{} link(s) in {}, {} cancelled, {} failed",
        plan.links.len(),
        humantime::format_duration(elapsed),
        scope.cancellations(),
        scope.failures()
    );
    Ok(())
}

pub fn exec(plan: plan::Plan) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build tokio runtime: {e}"))?
        .block_on(exec_async(plan))
}
