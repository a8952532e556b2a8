//! Queries through the facade

use crate::common::*;

fn town(ts: &TestStore) -> Vec<Record<User>> {
    vec![
        ts.user("ann@x.com", 25, "Lyon"),
        ts.user("bob@x.com", 34, "Paris"),
        ts.user("cat@x.com", 34, "Nice"),
        ts.user("dan@x.com", 61, "Paris"),
        ts.user("eve@x.com", 19, "Lyon"),
    ]
}

#[test]
fn prefixed_and_bare_field_names_are_equivalent() {
    let ts = TestStore::new();
    town(&ts);

    let mut bare = Finder::<User>::new();
    bare.filter("city", Operator::Eq, "Paris").unwrap();
    let mut prefixed = Finder::<User>::new();
    prefixed.filter("usr_city", Operator::Eq, "Paris").unwrap();

    assert_eq!(ts.ids(&mut bare), ts.ids(&mut prefixed));
    assert_eq!(bare.len(), 2);
    assert_eq!(prefixed.filters(true).conditions().next().unwrap().field, "usr_city");
}

#[test]
fn combined_conditions() {
    let ts = TestStore::new();
    let people = town(&ts);

    // (city = Paris AND age >= 40) OR age < 20
    let mut finder = Finder::<User>::new();
    finder
        .filter("city", Operator::Eq, "Paris")
        .unwrap()
        .and("age", Operator::Ge, 40)
        .unwrap()
        .or("age", Operator::Lt, 20)
        .unwrap();

    assert_eq!(
        ts.ids(&mut finder),
        ids_of(&[&people[3], &people[4]])
    );
}

#[test]
fn sorted_and_paged() {
    let ts = TestStore::new();
    let people = town(&ts);

    let mut finder = Finder::<User>::new();
    finder
        .filter("age", Operator::Range, (18, 65))
        .unwrap()
        .sort("age", true)
        .sort("usr_email", false)
        .page(3, 1);

    assert_eq!(ts.store.find(&mut finder).unwrap(), 3);
    let emails: Vec<_> = finder
        .iter()
        .map(|r| r.get("email").cloned().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec![
            Value::from("bob@x.com"),
            Value::from("cat@x.com"),
            Value::from("ann@x.com"),
        ]
    );
    assert_eq!(finder.records()[0], people[1]);
}

#[test]
fn not_equal_against_a_list() {
    let ts = TestStore::new();
    let people = town(&ts);

    let mut finder = Finder::<User>::new();
    finder
        .filter("city", Operator::Ne, vec![Value::from("Paris"), Value::from("Lyon")])
        .unwrap();
    assert_eq!(ts.ids(&mut finder), ids_of(&[&people[2]]));
}

#[test]
fn filter_starts_over() {
    let ts = TestStore::new();
    town(&ts);

    let mut finder = Finder::<User>::new();
    finder
        .filter("city", Operator::Eq, "Paris")
        .unwrap()
        .page(1, 0);
    ts.store.find(&mut finder).unwrap();
    assert_eq!(finder.len(), 1);

    // a new filter drops the old paging and the old results
    finder.filter("city", Operator::Eq, "Lyon").unwrap();
    assert!(finder.filters(false).paging.is_none());
    ts.store.find(&mut finder).unwrap();
    assert_eq!(finder.len(), 2);
}

#[test]
fn queries_see_updates_and_removals() {
    let ts = TestStore::new();
    let mut people = town(&ts);

    people[0].set("city", "Paris").unwrap();
    ts.store.save(&mut people[0]).unwrap();
    ts.store.remove(&mut people[3]).unwrap();

    let mut finder = Finder::<User>::new();
    finder.filter("city", Operator::Eq, "Paris").unwrap();
    assert_eq!(ts.ids(&mut finder), ids_of(&[&people[0], &people[1]]));

    finder.filter("city", Operator::Eq, "Lyon").unwrap();
    assert_eq!(ts.ids(&mut finder), ids_of(&[&people[4]]));
}

#[test]
fn unindexed_fields_match_nothing() {
    let ts = TestStore::new();
    town(&ts);

    let mut finder = Finder::<User>::new();
    finder.filter("bio", Operator::Ne, "x").unwrap();
    assert_eq!(ts.store.find(&mut finder).unwrap(), 0);
}

#[test]
fn unknown_fields_are_rejected() {
    let ts = TestStore::new();
    town(&ts);
    std::fs::write(ts.path().join("secret.key"), "x=[\"2026101600000001\"]\n").unwrap();

    let mut finder = Finder::<User>::new();
    for field in ["nope", "../secret", "usr_../secret"] {
        let err = finder.filter(field, Operator::Eq, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", field);
    }
    assert_eq!(ts.store.find(&mut finder).unwrap(), 0);

    // Article fields are not User fields
    assert!(finder.filter("slug", Operator::Eq, "x").is_err());
}

#[test]
fn malformed_range_is_rejected_up_front() {
    let mut finder = Finder::<User>::new();
    let err = finder.filter("age", Operator::Range, 30).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(finder.filters(false).conditions.is_empty());
}
