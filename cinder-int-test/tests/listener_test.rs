use cinder::doc;
use cinder::filter::WhereOperator;
use cinder_int_test::test_util::{cleanup, create_test_context, run_test};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn wait_until(timeout_ms: u64, check: impl Fn() -> bool) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}

#[test]
fn test_listener_reports_changes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            users.doc("u1")?.set(doc! { name: "Ada", age: 36 })?;

            let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
            let sink = seen.clone();
            let registration = users
                .where_field("age", WhereOperator::GreaterThanOrEqual, 18)?
                .on_snapshot(move |snapshot| sink.lock().unwrap().push(snapshot.ids()))?;

            wait_until(2_000, || seen.lock().unwrap().len() == 1);
            assert_eq!(seen.lock().unwrap()[0], vec!["u1"]);

            // a write outside the result set does not fire
            users.doc("u2")?.set(doc! { name: "Kid", age: 9 })?;
            let polls = registration.poll_count();
            wait_until(2_000, || registration.poll_count() >= polls + 3);
            assert_eq!(seen.lock().unwrap().len(), 1);

            users.doc("u2")?.update(doc! { age: 19 })?;
            wait_until(2_000, || seen.lock().unwrap().len() == 2);
            assert_eq!(seen.lock().unwrap()[1], vec!["u1", "u2"]);

            registration.unsubscribe()?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dropped_listener_stops() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;

            let seen = Arc::new(Mutex::new(0usize));
            let sink = seen.clone();
            let registration = users.on_snapshot(move |_| *sink.lock().unwrap() += 1)?;
            wait_until(2_000, || *seen.lock().unwrap() == 1);
            drop(registration);

            users.doc("u1")?.set(doc! { name: "Ada" })?;
            thread::sleep(Duration::from_millis(200));
            assert_eq!(*seen.lock().unwrap(), 1);
            Ok(())
        },
        cleanup,
    )
}
