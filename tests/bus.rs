//! Dispatch, unsubscribe and scoped delivery through the public API.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{Recorder, Trace};
use waypost::bus::{Click, Key};
use waypost::{Dispatcher, Event, ScopeDirectory, Shape};

#[test]
fn test_click_reaches_click_handler_once() {
    let bus = Dispatcher::new();
    let recorder = Recorder::new();
    bus.subscribe(Shape::Click, recorder.handler());

    let delivered = bus.dispatch(&Event::Click(Click { x: 1, y: 2 }));
    assert_eq!(delivered, 1);
    assert_eq!(recorder.events(), vec![Event::Click(Click { x: 1, y: 2 })]);

    bus.dispatch(&Event::custom("tick", 1));
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_handlers_run_in_subscription_order() {
    let bus = Dispatcher::new();
    let trace = Trace::default();
    bus.subscribe(Shape::Key, trace.mark("h1"));
    bus.subscribe(Shape::Input, trace.mark("h2"));
    bus.subscribe(Shape::Key, trace.mark("h3"));

    bus.dispatch(&Event::Key(Key {
        key: "a".into(),
        ..Key::default()
    }));
    assert_eq!(trace.labels(), vec!["h1", "h2", "h3"]);
}

#[test]
fn test_unsubscribe_twice_is_noop() {
    let bus = Dispatcher::new();
    let teardowns = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&teardowns);
    let recorder = Recorder::new();
    let token = bus.subscribe_with(
        Shape::Click,
        recorder.handler(),
        vec![Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })],
    );

    assert!(bus.unsubscribe(token));
    assert!(!bus.unsubscribe(token));
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    assert_eq!(bus.dispatch(&Event::Click(Click::default())), 0);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_scoped_delivery_by_owner() {
    let bus = Dispatcher::new();
    let scopes = ScopeDirectory::new(&bus);
    let u1 = scopes.scope("u1");
    let u2 = scopes.scope("u2");

    let seen_u1 = Recorder::new();
    let seen_u2 = Recorder::new();
    u1.subscribe(Shape::Custom, seen_u1.handler());
    u2.subscribe(Shape::Custom, seen_u2.handler());

    u1.publish_global(&Event::scoped("u2", Event::custom("value", 42)));

    assert_eq!(seen_u1.count(), 0);
    assert_eq!(seen_u2.events(), vec![Event::custom("value", 42)]);
}

#[test]
fn test_closed_scope_stops_receiving() {
    let bus = Dispatcher::new();
    let scopes = ScopeDirectory::new(&bus);
    let scope = scopes.anonymous();
    let owner = scope.owner_id().to_string();
    let recorder = Recorder::new();
    scope.subscribe(Shape::Any, recorder.handler());

    bus.dispatch(&Event::scoped(owner.clone(), Event::custom("a", 1)));
    assert!(scopes.remove(&owner));
    drop(scope);

    bus.dispatch(&Event::scoped(owner, Event::custom("b", 2)));
    assert_eq!(recorder.shapes(), vec![Shape::Custom]);
    assert!(bus.is_empty());
}

#[test]
fn test_concurrent_subscribe_dispatch_unsubscribe() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let bus = Dispatcher::new();
    let teardowns = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let bus = bus.clone();
            let teardowns = Arc::clone(&teardowns);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let counter = Arc::clone(&teardowns);
                    let token = bus.subscribe_with(
                        Shape::Click,
                        |_| {},
                        vec![Box::new(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })],
                    );
                    assert!(bus.dispatch(&Event::Click(Click::default())) >= 1);
                    assert!(bus.unsubscribe(token));
                    assert!(!bus.unsubscribe(token));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(teardowns.load(Ordering::SeqCst), THREADS * ROUNDS);
    assert!(bus.is_empty());
}
