use relay_deferred::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const GRACE: Duration = Duration::from_millis(100);

fn add_one(x: i32) -> DeferredValue<i32> {
    resolve(x + 1)
}

fn double(x: i32) -> DeferredValue<i32> {
    resolve(x * 2)
}

fn drop_odd(x: i32) -> DeferredValue<i32> {
    if x % 2 == 0 {
        resolve(x)
    } else {
        DeferredValue::empty()
    }
}

#[tokio::test]
async fn resolve_delivers_exactly_once() {
    for v in [0, -7, i32::MAX] {
        let mut d = resolve(v);
        assert_eq!(d.read().await, Some(v));
        assert_eq!(d.read().await, None);
    }
}

#[tokio::test(start_paused = true)]
async fn two_link_chain_with_far_deadline() {
    let (token, _cancel) = with_deadline(time::Duration::hours(1));

    let m1 = resolve(1);
    let m2 = compose(&token, m1, add_one);
    let mut m3 = compose(&token, m2, add_one);

    assert_eq!(m3.read().await, Some(3));
    assert_eq!(m3.read().await, None);
}

#[tokio::test(start_paused = true)]
async fn slow_final_link_misses_deadline() {
    let scope = Scope::with_deadline(time::Duration::seconds(1));
    let fallback_produced = Arc::new(AtomicBool::new(false));

    let m1 = resolve(1);
    let m2 = scope.compose(m1, add_one);
    let last = scope.compose(m2, {
        let token = scope.token().clone();
        let fallback_produced = fallback_produced.clone();
        move |x| {
            spawn(&token, async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                fallback_produced.store(true, Ordering::SeqCst);
                x + 1
            })
        }
    });

    assert_eq!(last.await, None);

    // Let the clock run well past the point the transform would have finished
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!fallback_produced.load(Ordering::SeqCst));

    scope.shutdown_within(GRACE).await.unwrap();
    assert_eq!(scope.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn composition_is_associative() {
    let fs: [fn(i32) -> DeferredValue<i32>; 3] = [add_one, double, drop_odd];
    let token = CancellationToken::new();

    for start in -2..4 {
        for f in fs {
            for g in fs {
                let left = compose(&token, compose(&token, resolve(start), f), g);

                let t2 = token.clone();
                let right = compose(&token, resolve(start), move |x| compose(&t2, f(x), g));

                assert_eq!(left.await, right.await, "start={start}");
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn associativity_holds_for_async_transforms() {
    let scope = Arc::new(Scope::new(CancellationToken::new()));

    let slow_add = {
        let scope = scope.clone();
        move |x: i32| {
            scope.spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                x + 10
            })
        }
    };

    let left = scope.compose(scope.compose(resolve(5), slow_add.clone()), double);
    let right = scope.compose(resolve(5), {
        let scope = scope.clone();
        move |x| scope.compose(slow_add(x), double)
    });

    assert_eq!(left.await, Some(30));
    assert_eq!(right.await, Some(30));

    scope.wait().await;
    assert_eq!(scope.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_production_closes_whole_chain() {
    let scope = Scope::new(CancellationToken::new());
    let (_resolver, source) = DeferredValue::<i32>::pending();

    let mut last = source;
    for _ in 0..5 {
        last = scope.compose(last, add_one);
    }
    assert_eq!(scope.active_tasks(), 5);

    scope.cancel();

    assert_eq!(last.await, None);
    scope.shutdown_within(GRACE).await.unwrap();
    assert_eq!(scope.active_tasks(), 0);
    assert_eq!(scope.cancellations(), 5);
}

#[tokio::test(start_paused = true)]
async fn deadline_before_production_releases_every_task() {
    let scope = Scope::with_deadline(time::Duration::milliseconds(100));
    let (resolver, source) = DeferredValue::<i32>::pending();

    let m = scope.compose(source, add_one);
    let m = scope.compose(m, add_one);
    let m = scope.compose(m, add_one);
    assert_eq!(scope.active_tasks(), 3);

    // Nobody cancels explicitly; only the deadline can release the links
    scope.wait().await;
    assert_eq!(scope.active_tasks(), 0);
    assert_eq!(scope.cancellations(), 3);

    assert!(resolver.is_abandoned());
    assert_eq!(m.await, None);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_delivery_keeps_value() {
    let scope = Scope::new(CancellationToken::new());

    let mut link = scope.compose(resolve(1), add_one);
    scope.wait().await;

    scope.cancel();

    // Delivered before the token fired, so it is still there for its reader
    assert_eq!(link.read().await, Some(2));
    scope.shutdown_within(GRACE).await.unwrap();
    assert_eq!(scope.cancellations(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_delivery_stops_later_links() {
    let scope = Scope::new(CancellationToken::new());
    let token = scope.token().clone();

    let first = scope.compose(resolve(1), add_one);
    let second = scope.compose(first, move |x| {
        spawn(&token, async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            x + 1
        })
    });
    let third = scope.compose(second, add_one);

    // By now the first link has delivered into the second
    tokio::time::sleep(Duration::from_millis(10)).await;
    scope.cancel();

    assert_eq!(third.await, None);
    scope.shutdown_within(GRACE).await.unwrap();
    assert_eq!(scope.cancellations(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_chain_halts_at_the_waiting_link() {
    let scope = Scope::new(CancellationToken::new());
    let (resolver, gate) = DeferredValue::<i32>::pending();

    // Link 1 delivers at once, link 2 waits on the gate
    let m1 = scope.compose(resolve(1), add_one);
    let m2 = scope.compose(m1, move |_| gate);
    let m3 = scope.compose(m2, add_one);

    tokio::time::sleep(Duration::from_millis(10)).await;
    scope.cancel();

    // The gate opening after cancellation is never observed downstream
    _ = resolver.resolve(100);
    assert_eq!(m3.await, None);

    scope.shutdown_within(GRACE).await.unwrap();
    assert_eq!(scope.active_tasks(), 0);
    assert_eq!(scope.cancellations(), 2);
}

#[test]
fn blocking_reader_at_end_of_chain() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let token = CancellationToken::new();

    let mut m = {
        let _guard = rt.enter();
        let m = compose(&token, resolve(20), double);
        map(&token, m, |x| x + 2)
    };

    assert_eq!(m.read_blocking(), Some(42));
    assert_eq!(m.read_blocking(), None);
}
