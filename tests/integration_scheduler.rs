//! Scheduler integration tests
//!
//! Drives a `FrameScheduler` through a `HeadlessHost` using only the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickr::bus::{EventBus, bootstrap};
use tickr::config::TickrConfig;
use tickr::error::Result;
use tickr::runtime::{FrameLoop, StopReason};
use tickr::{FrameScheduler, HeadlessHost, QueueKind, TickrError};

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

/// Integration test: the default/scroll/resize walkthrough
#[test]
fn test_three_queue_walkthrough() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;

    let (a, fn_a) = counter();
    scheduler.add("a", fn_a, QueueKind::Default);
    host.fire_frame();
    assert_eq!(a.get(), 2, "registration call plus one default tick");

    let (b, fn_b) = counter();
    let (c, fn_c) = counter();
    scheduler.add("b", fn_b, "scroll");
    scheduler.add("c", fn_c, "resize");
    host.set_scroll(0.0, 50.0);
    host.fire_frame();

    assert_eq!(a.get(), 3);
    assert_eq!(b.get(), 2, "scroll moved from (0, 0) to (0, 50)");
    assert_eq!(c.get(), 1, "viewport unchanged");
    Ok(())
}

/// Integration test: N identical samples trigger a gated queue once
#[test]
fn test_change_gating_over_many_ticks() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;
    host.fire_frame();

    let (scroll_hits, on_scroll) = counter();
    let (resize_hits, on_resize) = counter();
    scheduler.add("parallax", on_scroll, QueueKind::Scroll);
    scheduler.add("layout", on_resize, QueueKind::Resize);

    host.set_scroll(12.0, 340.0);
    host.set_viewport(1280, 720);
    for _ in 0..10 {
        host.fire_frame();
    }
    assert_eq!(scroll_hits.get(), 2);
    assert_eq!(resize_hits.get(), 2);

    // Moving back to a previously seen value still counts as a change
    host.set_scroll(0.0, 0.0);
    host.fire_frame();
    assert_eq!(scroll_hits.get(), 3);
    Ok(())
}

/// Integration test: blur pause keeps the tick chain alive
#[test]
fn test_blur_pause_resume() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;
    let (hits, f) = counter();
    scheduler.add("a", f, QueueKind::Default);

    host.blur();
    for _ in 0..5 {
        host.step(16);
    }
    assert_eq!(hits.get(), 1);
    assert_eq!(scheduler.frames_processed(), 0);
    assert_eq!(scheduler.get_fps(), 0);
    assert_eq!(host.pending_frames(), 1);

    host.focus();
    host.step(16);
    assert_eq!(hits.get(), 2);
    assert_eq!(scheduler.frames_processed(), 1);
    Ok(())
}

/// Integration test: explicit pause survives focus changes
#[test]
fn test_explicit_pause_survives_focus() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;
    let (hits, f) = counter();
    scheduler.add("a", f, QueueKind::Default);

    scheduler.pause();
    host.blur();
    host.focus();
    host.fire_frame();
    assert_eq!(hits.get(), 1);

    scheduler.toggle();
    host.fire_frame();
    assert_eq!(hits.get(), 2);
    Ok(())
}

/// Integration test: callbacks reach the scheduler through a cloned handle
#[test]
fn test_self_removing_callback() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;
    let runs = Rc::new(Cell::new(0));

    let handle = scheduler.clone();
    let count = Rc::clone(&runs);
    scheduler.add(
        "fade-in",
        move || {
            count.set(count.get() + 1);
            if count.get() >= 3 {
                handle.remove("fade-in", QueueKind::Default);
            }
        },
        QueueKind::Default,
    );

    for _ in 0..10 {
        host.fire_frame();
    }
    assert_eq!(runs.get(), 3);
    assert!(!scheduler.contains("fade-in", QueueKind::Default));
    Ok(())
}

/// Integration test: one failing callback does not starve the others
#[test]
fn test_failure_isolation_across_queues() -> Result<()> {
    let host = Rc::new(HeadlessHost::new());
    let scheduler = FrameScheduler::new(Rc::clone(&host))?;
    let armed = Rc::new(Cell::new(false));
    let trigger = Rc::clone(&armed);

    scheduler.add(
        "flaky",
        move || {
            if trigger.get() {
                panic!("layout exploded");
            }
        },
        QueueKind::Default,
    );
    let (scroll_hits, on_scroll) = counter();
    scheduler.add("parallax", on_scroll, QueueKind::Scroll);
    armed.set(true);

    host.set_scroll(0.0, 1.0);
    host.fire_frame();
    assert_eq!(scroll_hits.get(), 2);
    assert_eq!(scheduler.callback_failures(), 1);
    assert_eq!(host.pending_frames(), 1);
    Ok(())
}

/// Integration test: construction fails without a frame primitive
#[test]
fn test_host_without_frames() {
    let host = Rc::new(HeadlessHost::without_frames());
    let result = FrameScheduler::new(host);
    assert!(matches!(result, Err(TickrError::FrameSourceUnavailable(_))));
}

/// Integration test: dependents wait for the scheduler-ready event
#[test]
fn test_deferred_bootstrap_through_bus() -> Result<()> {
    let bus = Rc::new(EventBus::new("FJBO"));
    let host = Rc::new(HeadlessHost::new());
    let mut config = TickrConfig::default();
    config.namespace = "FJBO".to_string();
    let slot = bootstrap(Rc::clone(&host), config, &bus)?;

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let dependent_slot = Rc::clone(&slot);
    bus.on("FJBO.Scheduler.ready", move |event| {
        let scheduler = dependent_slot.get().expect("scheduler ready");
        let sink = Rc::clone(&sink);
        assert_eq!(event, "FJBO.Scheduler.ready");
        scheduler.add("dependent", move || sink.borrow_mut().push("tick"), QueueKind::Default);
    });

    assert!(slot.get().is_none());
    bus.mark_ready();
    assert_eq!(log.borrow().len(), 1);

    host.fire_frame();
    assert_eq!(log.borrow().len(), 2);
    Ok(())
}

/// Integration test: paced frame loop over a realtime host
#[test]
fn test_frame_loop_realtime() -> Result<()> {
    let host = Rc::new(HeadlessHost::realtime());
    let mut config = TickrConfig::default();
    config.runtime.target_fps = 200;
    config.runtime.max_frames = Some(20);
    let scheduler = FrameScheduler::with_config(Rc::clone(&host), &config)?;
    let (hits, f) = counter();
    scheduler.add("a", f, QueueKind::Default);

    let report = FrameLoop::new(&config.runtime).run(&host, |_, _| {});
    assert_eq!(report.frames, 20);
    assert_eq!(report.reason, StopReason::MaxFrames);
    assert_eq!(hits.get(), 21);
    // 20 frames at a 5 ms budget
    assert!(report.elapsed.as_millis() >= 90);
    Ok(())
}
