//! Scheduler tests, ticked by hand against the simulated timer

use std::sync::Mutex;

use tickwork_posix::SimTimer;
use tickwork_queue::DeferredQueue;
use tickwork_sched::{Action, Scheduler, SchedulerConfig, TaskConfig, TaskId, Tick, TwError};

type TestScheduler<'a> = Scheduler<'a, &'a SimTimer, DeferredQueue<64>, 4>;

fn noop() {}

fn scheduler<'a>(timer: &'a SimTimer, queue: &'a DeferredQueue<64>) -> TestScheduler<'a> {
    let sched = Scheduler::new(timer, queue, SchedulerConfig::new(1_000).with_rollover(1_000));
    sched.init().unwrap();
    sched
}

/// Tick `ticks` times and return the counter values at which work was queued.
fn run(sched: &TestScheduler<'_>, queue: &DeferredQueue<64>, ticks: usize) -> Vec<u32> {
    let mut fired = Vec::new();
    for _ in 0..ticks {
        sched.update();
        if queue.drain() > 0 {
            fired.push(sched.counter().raw());
        }
    }
    fired
}

#[test]
fn test_init_programs_tick_timer() {
    let timer = SimTimer::new(72_000_000);
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    assert!(sched.is_initialized());
    assert!(timer.is_enabled());
    assert_eq!(timer.config().prescaler, 36_000);
    assert_eq!(timer.config().reload, 1);
    assert_eq!(sched.frequency(), 1_000);
    assert_eq!(sched.rollover(), 1_000);
    assert_eq!(sched.capacity(), 4);

    sched.init().unwrap();
    assert_eq!(timer.configure_count(), 1);
}

#[test]
fn test_init_rejects_bad_tick_rates() {
    let queue: DeferredQueue<64> = DeferredQueue::new();

    let timer = SimTimer::new(1_000);
    let sched: TestScheduler<'_> = Scheduler::new(&timer, &queue, SchedulerConfig::new(0));
    assert_eq!(sched.init(), Err(TwError::InvalidParameter));

    let sched: TestScheduler<'_> = Scheduler::new(&timer, &queue, SchedulerConfig::new(2_000));
    assert_eq!(sched.init(), Err(TwError::InvalidParameter));
    assert!(!sched.is_initialized());
    assert!(!timer.is_enabled());

    let timer = SimTimer::default();
    timer.refuse_configure(true);
    let sched: TestScheduler<'_> = Scheduler::new(&timer, &queue, SchedulerConfig::default());
    assert_eq!(sched.init(), Err(TwError::Timer));
    assert!(!sched.is_initialized());
}

#[test]
fn test_uninitialized_scheduler_is_inert() {
    let timer = SimTimer::default();
    let queue: DeferredQueue<64> = DeferredQueue::new();
    let sched: TestScheduler<'_> = Scheduler::new(&timer, &queue, SchedulerConfig::default());

    assert_eq!(
        sched.add_task(TaskConfig::new(Action::from_fn(noop))),
        Err(TwError::NotInitialized)
    );
    sched.update();
    assert_eq!(sched.counter(), Tick(0));
    assert!(queue.is_empty());
}

#[test]
fn test_periodic_task_keeps_phase_across_rollover() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let id = sched
        .add_task(
            TaskConfig::new(Action::from_fn(noop))
                .interval(100)
                .start_offset(250),
        )
        .unwrap();
    assert_eq!(sched.next_due(id), Some(Tick(250)));
    assert_eq!(sched.interval(id), 100);
    assert_eq!(sched.start_offset(id), 250);

    let fired = run(&sched, &queue, 1_200);
    assert_eq!(fired, vec![250, 350, 450, 550, 650, 750, 850, 950, 50, 150]);
}

#[test]
fn test_late_offset_aligns_to_phase() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    run(&sched, &queue, 300);
    sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).interval(100).start_offset(250))
        .unwrap();

    assert_eq!(run(&sched, &queue, 200), vec![350, 450]);
}

#[test]
fn test_one_shot_fires_once_and_frees_slot() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let id = sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).start_offset(3))
        .unwrap();
    assert_eq!(id, TaskId(0));
    assert_eq!(sched.task_count(), 1);

    assert_eq!(run(&sched, &queue, 10), vec![3]);
    assert_eq!(sched.task_count(), 0);
    assert_eq!(sched.next_due(id), None);

    // Offset already passed: fires on the next tick
    let id = sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).start_offset(5))
        .unwrap();
    assert_eq!(id, TaskId(0));
    assert_eq!(run(&sched, &queue, 10), vec![11]);
}

#[test]
fn test_due_tasks_submit_in_slot_order() {
    static LOG: Mutex<Vec<usize>> = Mutex::new(Vec::new());
    fn record(id: usize) {
        LOG.lock().unwrap().push(id);
    }

    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    sched
        .add_task(TaskConfig::new(Action::with_arg(record, 1)).interval(5))
        .unwrap();
    sched
        .add_task(TaskConfig::new(Action::with_arg(record, 2)).start_offset(5))
        .unwrap();

    for _ in 0..5 {
        sched.update();
    }
    assert_eq!(queue.len(), 2);
    queue.drain();
    assert_eq!(*LOG.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_disable_enable_and_remove() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let id = sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).interval(2))
        .unwrap();
    assert!(sched.is_enabled(id));
    assert_eq!(run(&sched, &queue, 4), vec![2, 4]);

    sched.disable_task(id).unwrap();
    assert!(!sched.is_enabled(id));
    assert!(run(&sched, &queue, 10).is_empty());

    // Missed periods are skipped, not replayed
    sched.enable_task(id).unwrap();
    assert_eq!(run(&sched, &queue, 4), vec![15, 17]);

    sched.remove_task(id).unwrap();
    assert!(run(&sched, &queue, 10).is_empty());
    assert_eq!(sched.disable_task(id), Err(TwError::InvalidTask));
    assert_eq!(sched.remove_task(id), Err(TwError::InvalidTask));
    assert_eq!(sched.task_count(), 0);
}

#[test]
fn test_disabled_registration_waits_for_enable() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let id = sched
        .add_task(
            TaskConfig::new(Action::from_fn(noop))
                .interval(10)
                .enabled(false),
        )
        .unwrap();
    assert!(!sched.is_enabled(id));
    assert!(run(&sched, &queue, 35).is_empty());

    sched.enable_task(id).unwrap();
    assert_eq!(run(&sched, &queue, 1), vec![36]);
    assert_eq!(sched.next_due(id), Some(Tick(46)));
}

#[test]
fn test_task_disabled_across_rollover_fires_on_enable() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    assert!(run(&sched, &queue, 985).is_empty());
    let id = sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).interval(10))
        .unwrap();
    assert_eq!(sched.next_due(id), Some(Tick(990)));
    sched.disable_task(id).unwrap();

    // 986..=999, then the wrap to 0 and on to 50
    assert!(run(&sched, &queue, 65).is_empty());
    assert_eq!(sched.counter(), Tick(50));

    sched.enable_task(id).unwrap();
    assert_eq!(run(&sched, &queue, 1), vec![51]);
    assert_eq!(sched.next_due(id), Some(Tick(61)));
    assert_eq!(run(&sched, &queue, 20), vec![61, 71]);
}

#[test]
fn test_invalid_ids_are_neutral() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let missing = TaskId(99);
    assert_eq!(sched.enable_task(missing), Err(TwError::InvalidTask));
    assert_eq!(sched.disable_task(missing), Err(TwError::InvalidTask));
    assert_eq!(sched.set_interval(missing, 5), Err(TwError::InvalidTask));
    assert_eq!(sched.remove_task(TaskId(1)), Err(TwError::InvalidTask));
    assert_eq!(sched.interval(missing), 0);
    assert!(!sched.is_enabled(missing));
    assert_eq!(sched.next_due(missing), None);
}

#[test]
fn test_registration_limits() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    assert_eq!(
        sched.add_task(TaskConfig::new(Action::from_fn(noop)).interval(1_000)),
        Err(TwError::InvalidParameter)
    );
    assert_eq!(
        sched.add_task(TaskConfig::new(Action::from_fn(noop)).start_offset(1_000)),
        Err(TwError::InvalidParameter)
    );
    assert_eq!(sched.task_count(), 0);

    for expected in 0..4 {
        let id = sched
            .add_task(TaskConfig::new(Action::from_fn(noop)).interval(999))
            .unwrap();
        assert_eq!(id, TaskId(expected));
    }
    assert_eq!(
        sched.add_task(TaskConfig::new(Action::from_fn(noop))),
        Err(TwError::TaskTableFull)
    );

    let stats = sched.stats();
    assert_eq!(stats.in_use, 4);
    assert_eq!(stats.peak_in_use, 4);
    assert_eq!(stats.rejected, 1);
    assert!(stats.is_full());
}

#[test]
fn test_set_interval_applies_after_next_firing() {
    let timer = SimTimer::default();
    let queue = DeferredQueue::new();
    let sched = scheduler(&timer, &queue);

    let id = sched
        .add_task(TaskConfig::new(Action::from_fn(noop)).interval(10))
        .unwrap();
    assert_eq!(sched.set_interval(id, 1_000), Err(TwError::InvalidParameter));
    sched.set_interval(id, 3).unwrap();
    assert_eq!(sched.interval(id), 3);

    assert_eq!(run(&sched, &queue, 16), vec![10, 13, 16]);
}

#[test]
fn test_full_queue_drops_are_counted() {
    let timer = SimTimer::default();
    let queue: DeferredQueue<2> = DeferredQueue::new();
    let sched: Scheduler<'_, &SimTimer, DeferredQueue<2>, 4> =
        Scheduler::new(&timer, &queue, SchedulerConfig::new(1_000));
    sched.init().unwrap();

    for _ in 0..3 {
        sched
            .add_task(TaskConfig::new(Action::from_fn(noop)).start_offset(1))
            .unwrap();
    }
    sched.update();

    assert_eq!(queue.len(), 2);
    assert_eq!(sched.stats().rejected, 1);
    assert_eq!(sched.task_count(), 0);
    assert_eq!(queue.stats().rejected, 1);
}
