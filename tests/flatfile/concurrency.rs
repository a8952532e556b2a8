//! Sharing one engine between threads
//!
//! Key files are locked per operation, so reads may run alongside anything.
//! Inserts into the same table are left to the caller to serialize; here
//! each writer owns a table.

use std::sync::{Arc, Barrier};
use std::thread;

use crate::common::*;

#[test]
fn parallel_readers() {
    let ts = TestStore::new();
    for n in 0..10 {
        ts.user(&format!("u{}@x.com", n), 20 + n, if n % 2 == 0 { "Lyon" } else { "Nice" });
    }
    let store = Arc::new(ts.reopen());
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut finder = Finder::<User>::new();
                finder.filter("city", Operator::Eq, "Lyon").unwrap();
                for _ in 0..20 {
                    assert_eq!(store.find(&mut finder).unwrap(), 5);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn one_writer_per_table() {
    let ts = TestStore::new();
    let store = Arc::new(ts.reopen());
    let barrier = Arc::new(Barrier::new(2));

    let users = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for n in 0..25 {
                let mut u = Record::<User>::new();
                u.set("email", format!("u{}@x.com", n)).unwrap();
                u.set("city", "Lyon").unwrap();
                store.save(&mut u).unwrap();
            }
        })
    };
    let articles = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for n in 0..25 {
                let mut a = Record::<Article>::new();
                a.set("slug", format!("post-{}", n)).unwrap();
                a.set("city", "Lyon").unwrap();
                store.save(&mut a).unwrap();
            }
        })
    };
    users.join().unwrap();
    articles.join().unwrap();

    let mut by_user = Finder::<User>::new();
    by_user.filter("city", Operator::Eq, "Lyon").unwrap();
    assert_eq!(store.find(&mut by_user).unwrap(), 25);

    let mut by_article = Finder::<Article>::new();
    by_article.filter("city", Operator::Eq, "Lyon").unwrap();
    assert_eq!(store.find(&mut by_article).unwrap(), 25);
}
