//! Record types living side by side in one store

use crate::common::*;

#[test]
fn each_type_gets_its_own_table() {
    let ts = TestStore::new();
    ts.user("a@x.com", 30, "Paris");
    ts.article("hello", "alice", 10);

    assert_eq!(ts.data_files("User"), 1);
    assert_eq!(ts.data_files("Article"), 1);

    // same field name, separate key files
    assert!(ts.key_file("User", "city").starts_with("Paris="));
    assert_eq!(ts.key_file("Article", "city"), "");
}

#[test]
fn ids_are_counted_per_table() {
    let ts = TestStore::new();
    let u = ts.user("a@x.com", 30, "Paris");
    let a = ts.article("hello", "alice", 10);

    // both tables start at counter 1 on the same day
    assert_eq!(u.to_string(), a.to_string());
    assert!(u.to_string().ends_with("00000001"));
}

#[test]
fn prefixed_names_are_accepted_on_prefixed_types() {
    let ts = TestStore::new();

    let mut u = Record::<User>::new();
    u.set("usr_email", "p@x.com").unwrap();
    u.set("age", 41).unwrap();
    ts.store.save(&mut u).unwrap();

    let mut loaded = Record::<User>::with_primary_key(u.to_string());
    assert!(ts.store.load(&mut loaded).unwrap());
    assert_eq!(loaded.get("email"), Some(&Value::from("p@x.com")));
    assert_eq!(loaded.get("usr_email"), Some(&Value::from("p@x.com")));
    assert_eq!(loaded.get("usr_id"), loaded.get("id"));

    // Article has no prefix, so a prefixed name is just an unknown field
    let mut a = Record::<Article>::new();
    let err = a.set("usr_slug", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn validators_guard_assignment() {
    let mut u = Record::<User>::new();
    assert!(u.set("email", "not-an-email").is_err());
    assert!(u.set("age", 200).is_err());
    assert!(u.set("age", 30.5).is_err());
    assert!(!u.has("email"));
    assert!(!u.has("age"));

    let mut a = Record::<Article>::new();
    assert!(a.set("body", f64::NAN).is_err());
    assert!(!a.has("body"));
    assert!(a.set("slug", "").is_err());
    assert!(a.set("slug", "ok").is_ok());
}

#[test]
fn unique_keys_do_not_cross_tables() {
    let ts = TestStore::new();
    ts.article("paris", "alice", 1);

    // "Paris" as a User city and "paris" as an Article slug do not interact
    ts.user("a@x.com", 30, "paris");
    ts.user("b@x.com", 31, "paris");

    let mut dup = Record::<Article>::new();
    dup.set("slug", "paris").unwrap();
    let err = ts.store.save(&mut dup).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(!dup.is_persisted());
    assert_eq!(ts.data_files("Article"), 1);
}

#[test]
fn update_then_remove_leaves_no_trace() {
    let ts = TestStore::new();
    let mut a = ts.article("draft", "alice", 0);

    a.set("slug", "published").unwrap();
    a.set("views", 5).unwrap();
    a.set("author", Value::Null).unwrap();
    ts.store.save(&mut a).unwrap();

    let slug = ts.key_file("Article", "slug");
    assert!(!slug.contains("draft"));
    assert!(slug.contains("published"));
    assert_eq!(ts.key_file("Article", "author"), "");

    assert!(ts.store.remove(&mut a).unwrap());
    assert!(!a.is_persisted());
    assert_eq!(ts.key_file("Article", "slug"), "");
    assert_eq!(ts.key_file("Article", "views"), "");
    assert_eq!(ts.data_files("Article"), 0);

    // a second remove has nothing to act on
    assert!(!ts.store.remove(&mut a).unwrap());
}
