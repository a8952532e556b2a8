//! Data surviving a fresh engine over the same directory

use crate::common::*;
use flatstore::{CONFIG_FILE_NAME, DEFAULT_SWAP_SIZE};

fn emails_in(store: &FlatFile, city: &str) -> Vec<Value> {
    let mut finder = Finder::<User>::new();
    finder
        .filter("city", Operator::Eq, city)
        .unwrap()
        .sort("email", false);
    store.find(&mut finder).unwrap();
    finder
        .iter()
        .map(|r| r.get("email").cloned().unwrap_or(Value::Null))
        .collect()
}

#[test]
fn reopened_store_sees_everything() {
    let ts = TestStore::new();
    let ann = ts.user("ann@x.com", 25, "Lyon");
    ts.user("bob@x.com", 34, "Lyon");

    let again = ts.reopen();
    assert_eq!(
        emails_in(&again, "Lyon"),
        vec![Value::from("ann@x.com"), Value::from("bob@x.com")]
    );

    let mut loaded = Record::<User>::with_primary_key(ann.to_string());
    assert!(again.load(&mut loaded).unwrap());
    assert_eq!(loaded, ann);

    // the counter carries on from the files already on disk
    let mut cat = Record::<User>::from_fields([("email", "cat@x.com")]).unwrap();
    again.save(&mut cat).unwrap();
    assert!(cat.to_string().ends_with("00000003"));
}

#[test]
fn compressed_store_round_trips() {
    let ts = TestStore::with_config(FlatFileConfig::new("").compress(true));
    let mut dan = ts.user("dan@x.com", 61, "Paris");

    let raw = std::fs::read(ts.table_dir("User").join(format!("{}.dat", dan))).unwrap();
    assert_eq!(&raw[..4], &[0x28, 0xb5, 0x2f, 0xfd]);

    let again = ts.reopen();
    assert!(again.config().compress);
    assert_eq!(emails_in(&again, "Paris"), vec![Value::from("dan@x.com")]);

    dan.set("city", "Nice").unwrap();
    again.save(&mut dan).unwrap();
    assert!(emails_in(&again, "Paris").is_empty());
    assert_eq!(emails_in(&ts.store, "Nice"), vec![Value::from("dan@x.com")]);
}

#[test]
fn open_reads_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    FlatFileConfig::new(dir.path())
        .compress(true)
        .swap_size(64)
        .write_to_file(&dir.path().join(CONFIG_FILE_NAME))
        .unwrap();

    let store = FlatFile::open(dir.path()).unwrap();
    assert!(store.config().compress);
    assert_eq!(store.config().swap_size, 64);
    assert_eq!(store.path(), dir.path());
    assert_eq!(store.formatter_id(), "json");

    // enough distinct keys to push every rewrite through the spill file
    for n in 0..20 {
        let mut u = Record::<User>::new();
        u.set("email", format!("u{}@x.com", n)).unwrap();
        u.set("city", format!("c{}", n)).unwrap();
        store.save(&mut u).unwrap();
    }
    let again = FlatFile::open(dir.path()).unwrap();
    assert_eq!(emails_in(&again, "c7"), vec![Value::from("u7@x.com")]);
}

#[test]
fn open_without_config_file_uses_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = FlatFile::open(dir.path()).unwrap();
    assert!(!store.config().compress);
    assert_eq!(store.config().swap_size, DEFAULT_SWAP_SIZE);
    assert!(store.connect().is_ok());
}

#[test]
fn default_config_file_is_loadable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    FlatFileConfig::write_default_if_missing(&path).unwrap();

    let store = FlatFile::open(dir.path()).unwrap();
    assert_eq!(store.config(), &FlatFileConfig::new(dir.path()));
}

#[test]
fn broken_config_file_is_refused() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "swap_size = -1\n").unwrap();
    let err = FlatFile::open(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "compress = \"yes\"\n").unwrap();
    let err = FlatFile::open(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
}

#[test]
fn zero_swap_size_spills_every_rewrite() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "swap_size = 0\n").unwrap();

    let store = FlatFile::open(dir.path()).unwrap();
    assert_eq!(store.config().swap_size, 0);

    let mut u = Record::<User>::from_fields([("email", "z@x.com"), ("city", "Lyon")]).unwrap();
    store.save(&mut u).unwrap();
    u.set("city", "Nice").unwrap();
    store.save(&mut u).unwrap();

    assert!(emails_in(&store, "Lyon").is_empty());
    assert_eq!(emails_in(&store, "Nice"), vec![Value::from("z@x.com")]);
}
