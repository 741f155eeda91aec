use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use market_pulse::job::TaskScheduler;

#[tokio::test]
async fn test_periodic_task_ticks_repeatedly() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut scheduler = TaskScheduler::new();

    let c = Arc::clone(&counter);
    scheduler.add_periodic_task("tick".to_string(), 20, move || {
        let c = Arc::clone(&c);
        async move {
            c.fetch_add(1, Ordering::SeqCst);
        }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.shutdown().await;

    assert!(counter.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_panicking_iteration_does_not_kill_the_loop() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut scheduler = TaskScheduler::new();

    let c = Arc::clone(&counter);
    scheduler.add_periodic_task("flaky".to_string(), 20, move || {
        let c = Arc::clone(&c);
        async move {
            let n = c.fetch_add(1, Ordering::SeqCst);
            // 偶数轮崩溃，循环必须继续
            if n % 2 == 0 {
                panic!("cycle blew up");
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.shutdown().await;

    // 崩溃轮之后仍有新轮次执行
    assert!(counter.load(Ordering::SeqCst) >= 4);
}

#[tokio::test]
async fn test_shutdown_stops_ticking() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut scheduler = TaskScheduler::new();

    let c = Arc::clone(&counter);
    scheduler.add_periodic_task("stop".to_string(), 20, move || {
        let c = Arc::clone(&c);
        async move {
            c.fetch_add(1, Ordering::SeqCst);
        }
    });

    tokio::time::sleep(Duration::from_millis(80)).await;
    scheduler.shutdown().await;

    let after_shutdown = counter.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), after_shutdown);
}
