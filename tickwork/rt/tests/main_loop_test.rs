use std::sync::atomic::{AtomicUsize, Ordering};

use tickwork_queue::{Action, DeferredQueue};
use tickwork_rt::{LoopStats, MainLoop};

#[test]
fn test_poll_runs_pending_work_then_idles() {
    static RAN: AtomicUsize = AtomicUsize::new(0);
    static IDLED: AtomicUsize = AtomicUsize::new(0);
    fn work() {
        RAN.fetch_add(1, Ordering::SeqCst);
    }
    fn idle() {
        IDLED.fetch_add(1, Ordering::SeqCst);
    }

    let queue: DeferredQueue<8> = DeferredQueue::new();
    let main_loop = MainLoop::with_idle(&queue, idle);

    queue.defer(Action::from_fn(work)).unwrap();
    queue.defer(Action::from_fn(work)).unwrap();

    assert_eq!(main_loop.poll(), 2);
    assert_eq!(RAN.load(Ordering::SeqCst), 2);
    assert_eq!(IDLED.load(Ordering::SeqCst), 0);

    assert_eq!(main_loop.poll(), 0);
    assert_eq!(IDLED.load(Ordering::SeqCst), 1);

    assert_eq!(
        main_loop.stats(),
        LoopStats {
            passes: 2,
            idle_passes: 1,
            executed: 2,
        }
    );
}

#[test]
fn test_run_until_idle_follows_chained_work() {
    static QUEUE: DeferredQueue<4> = DeferredQueue::new();
    static RAN: AtomicUsize = AtomicUsize::new(0);
    fn chain(remaining: usize) {
        RAN.fetch_add(1, Ordering::SeqCst);
        if remaining > 0 {
            QUEUE.defer(Action::with_arg(chain, remaining - 1)).unwrap();
        }
    }

    let main_loop = MainLoop::new(&QUEUE);
    QUEUE.defer(Action::with_arg(chain, 5)).unwrap();

    assert_eq!(main_loop.run_until_idle(), 6);
    assert_eq!(RAN.load(Ordering::SeqCst), 6);
    assert!(QUEUE.is_empty());
    assert_eq!(main_loop.stats().executed, 6);
}
