//! Store behavior tests
//!
//! Every property is checked against both snapshot log backends.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use edit_store::{FileStore, LogBackend, StoreConfig, StoreError, ValidationError};
use tempfile::tempdir;

const BACKENDS: [LogBackend; 2] = [LogBackend::Git, LogBackend::File];

fn open_store(root: &Path, backend: LogBackend) -> FileStore {
    let config = StoreConfig {
        backend,
        ..StoreConfig::at(root)
    };
    FileStore::open(&config).unwrap()
}

fn valid_samples() -> Vec<(&'static str, &'static str)> {
    vec![
        ("doc.json", "{\n  \"name\": \"demo\",\n  \"items\": [1, 2, 3]\n}"),
        ("doc.yaml", "name: demo\nitems:\n  - 1\n  - 2\n"),
        ("doc.yml", "- a\n- b\n"),
        ("doc.xml", "<config>\n  <item key=\"a\">1</item>\n</config>\n"),
    ]
}

fn malformed_samples() -> Vec<(&'static str, &'static str)> {
    vec![
        ("doc.json", "{\"name\": \"demo\",}"),
        ("doc.yaml", "name: [demo"),
        ("doc.yml", "a: b: c"),
        ("doc.xml", "<config><item></config>"),
    ]
}

#[test]
fn test_write_then_read_roundtrip() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        for (filename, content) in valid_samples() {
            store.write(filename, content).unwrap();
            let outcome = store.read(filename).unwrap();
            assert_eq!(outcome.content, content, "{backend:?} {filename}");
            assert!(!outcome.created);
        }
    }
}

#[test]
fn test_malformed_write_leaves_file_unchanged() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        for (filename, content) in malformed_samples() {
            let before = store.read(filename).unwrap().content;
            let history_before = store.history(filename, 20).len();

            let err = store.write(filename, content).unwrap_err();
            assert!(
                matches!(err, StoreError::Validation(ValidationError::Syntax { .. })),
                "{backend:?} {filename}: {err}"
            );

            assert_eq!(store.read(filename).unwrap().content, before);
            assert_eq!(store.history(filename, 20).len(), history_before);
        }
    }
}

#[test]
fn test_first_read_creates_default_document() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        let outcome = store.read("a.json").unwrap();
        assert!(outcome.created);

        let value: serde_json::Value = serde_json::from_str(&outcome.content).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["name"], "New File");
        let created = object["created"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());

        let history = store.history("a.json", 20);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Initial: a.json");
        assert!(dir.path().join("a.json").exists());
    }
}

#[test]
fn test_default_documents_for_yaml_and_xml() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), LogBackend::File);

    let yaml = store.read("new.yaml").unwrap().content;
    assert!(yaml.contains("name: New File"));

    let xml = store.read("new.xml").unwrap().content;
    assert!(xml.starts_with("<root>\n  <n>New File</n>\n  <created>"));
}

#[test]
fn test_history_counts_and_order() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        let mut ids = Vec::new();
        for i in 0..25 {
            let entry = store.write("count.json", &format!("{{\"n\": {i}}}")).unwrap();
            assert!(entry.message.starts_with("Update count.json: "));
            ids.push(entry.id);
        }

        let history = store.history("count.json", 20);
        assert_eq!(history.len(), 20);
        let newest_first: Vec<_> = ids.iter().rev().take(20).cloned().collect();
        let listed: Vec<_> = history.into_iter().map(|e| e.id).collect();
        assert_eq!(listed, newest_first, "{backend:?}");

        assert_eq!(store.history("count.json", 100).len(), 25);
        assert_eq!(store.history_default("count.json").len(), 20);
    }
}

#[test]
fn test_history_of_unknown_file_is_empty() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);
        store.read("other.json").unwrap();
        assert!(store.history("never.json", 20).is_empty());
        assert!(store.history("../../etc.json", 20).is_empty());
    }
}

#[test]
fn test_restore_appends_entry() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        let first = store.write("r.yaml", "version: 1\n").unwrap();
        store.write("r.yaml", "version: 2\n").unwrap();
        let before = store.history("r.yaml", 20).len();

        let restored = store.restore("r.yaml", &first.id).unwrap();
        assert_eq!(restored.content, "version: 1\n");
        assert_eq!(restored.entry.message, format!("Restored to version {}", first.id));
        assert_eq!(store.read("r.yaml").unwrap().content, "version: 1\n");

        let history = store.history("r.yaml", 20);
        assert_eq!(history.len(), before + 1, "{backend:?}");
        assert_eq!(history[0], restored.entry);
    }
}

#[test]
fn test_restore_by_short_id() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        let first = store.write("s.json", "[1]").unwrap();
        store.write("s.json", "[2]").unwrap();

        let restored = store.restore("s.json", &first.id[..7]).unwrap();
        assert_eq!(restored.content, "[1]");
    }
}

#[test]
fn test_restore_missing_entry_is_not_found() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        let other = store.write("other.json", "{}").unwrap();
        store.write("target.json", "[]").unwrap();

        for id in ["0000000", other.id.as_str()] {
            let err = store.restore("target.json", id).unwrap_err();
            assert!(
                matches!(err, StoreError::NotFound { .. }),
                "{backend:?} {id}: {err}"
            );
        }
        assert_eq!(store.read("target.json").unwrap().content, "[]");
        assert_eq!(store.history("target.json", 20).len(), 1);
    }
}

#[test]
fn test_read_is_idempotent() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        store.write("i.xml", "<a/>").unwrap();
        let first = store.read("i.xml").unwrap();
        let second = store.read("i.xml").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.history("i.xml", 20).len(), 1);
    }
}

#[test]
fn test_list_filters_extensions() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), backend);

        store.write("b.yml", "x: 1\n").unwrap();
        store.read("a.json").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hi").unwrap();

        let files: Vec<_> = store.list().unwrap().into_iter().collect();
        assert_eq!(files, vec!["a.json".to_string(), "b.yml".to_string()]);
    }
}

#[test]
fn test_concurrent_writes_serialize() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = Arc::new(open_store(dir.path(), backend));
        store.write("race.json", "{\"writer\": 0}").unwrap();
        let before = store.history("race.json", 100).len();

        let handles: Vec<_> = (1..=2)
            .map(|writer| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .write("race.json", &format!("{{\"writer\": {writer}}}"))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.history("race.json", 100);
        assert_eq!(history.len(), before + 2, "{backend:?}");

        // Current content is the snapshot committed last
        let current = store.read("race.json").unwrap().content;
        let newest = store.restore("race.json", &history[0].id).unwrap();
        assert_eq!(current, newest.content);
    }
}

#[test]
fn test_concurrent_first_reads_create_once() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = Arc::new(open_store(dir.path(), backend));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.read("lazy.yaml").unwrap())
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
        assert!(outcomes.windows(2).all(|w| w[0].content == w[1].content));
        assert_eq!(store.history("lazy.yaml", 20).len(), 1);
    }
}

#[test]
fn test_stores_are_independent() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let store_a = open_store(a.path(), LogBackend::File);
    let store_b = open_store(b.path(), LogBackend::Git);

    store_a.write("shared.json", "{\"store\": \"a\"}").unwrap();
    let read_b = store_b.read("shared.json").unwrap();
    assert!(read_b.created);
    assert_eq!(store_a.history("shared.json", 20).len(), 1);
    assert_eq!(store_b.history("shared.json", 20)[0].message, "Initial: shared.json");
}

#[test]
fn test_history_survives_reopen() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let entry = {
            let store = open_store(dir.path(), backend);
            store.write("keep.json", "{\"v\": 1}").unwrap()
        };

        let store = open_store(dir.path(), backend);
        let history = store.history("keep.json", 20);
        assert_eq!(history, vec![entry]);
    }
}
