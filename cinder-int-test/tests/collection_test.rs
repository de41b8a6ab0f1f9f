use cinder::doc;
use cinder::errors::ErrorKind;
use cinder_int_test::test_util::{cleanup, create_test_context, run_test};
use std::collections::HashSet;

#[test]
fn test_add_assigns_unique_ids() {
    run_test(
        || create_test_context(),
        |ctx| {
            let events = ctx.db().collection("events")?;
            let mut ids = HashSet::new();
            for i in 0..10_000 {
                let created = events.add(doc! { seq: i })?;
                assert_eq!(created.collection_path(), "events");
                ids.insert(created.id().to_string());
            }
            assert_eq!(ids.len(), 10_000);

            let stored = events.get()?;
            assert_eq!(stored.len(), 10_000);
            let stored_ids: HashSet<String> = stored.ids().into_iter().collect();
            assert_eq!(stored_ids, ids);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_list_collections() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            assert!(db.list_collections()?.is_empty());

            db.doc("users/u1")?.set(doc! { name: "Ada" })?;
            db.doc("users/u2")?.set(doc! { name: "Alan" })?;
            db.doc("orders/o1")?.set(doc! { total: 10 })?;
            db.doc("users/u1/posts/p1")?.set(doc! { title: "Notes" })?;
            db.doc("archive/2020/items/i1")?.set(doc! { n: 1 })?;

            let names: Vec<String> = db.list_collections()?.iter().map(|c| c.id().to_string()).collect();
            assert_eq!(names, vec!["archive", "orders", "users"]);

            db.doc("orders/o1")?.delete()?;
            let names: Vec<String> = db.list_collections()?.iter().map(|c| c.id().to_string()).collect();
            assert_eq!(names, vec!["archive", "users"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collection_references() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let posts = db.collection("users/u1/posts")?;
            assert_eq!(posts.id(), "posts");
            assert_eq!(posts.parent().map(|d| d.path().to_string()), Some("users/u1".to_string()));
            assert_eq!(posts, db.doc("users/u1")?.collection("posts")?);

            let post = posts.doc("p1")?;
            assert_eq!(post.parent(), posts);
            assert_eq!(posts.doc("a/b").unwrap_err().kind(), &ErrorKind::InvalidPath);
            Ok(())
        },
        cleanup,
    )
}
