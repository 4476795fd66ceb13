use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use bytes::Bytes;
use hostshim::core::{FetchProxy, FetchRequest, FetchResponse, Value};
use hostshim::kv::{Key, KeyRange, TransactionMode};
use hostshim::{
    Bridge, Environment, ErrorKind, HostServices, InitConfig, SandboxHost, Session, ShimError,
};
use serde_json::json;

#[test]
fn key_value_round_trip() {
    let env = Environment::sandbox();

    let open = env.indexed_db().open("library", Some(1));
    open.on_upgrade_needed(|upgrade| {
        assert_eq!(upgrade.old_version, 0);
        upgrade.database.create_object_store("books");
        Ok(())
    });
    env.run_until_idle();
    let db = open.result().unwrap();

    let store = db
        .transaction(["books"], TransactionMode::ReadWrite)
        .object_store("books")
        .unwrap();
    for (id, title) in [(1, "Dune"), (2, "Emma"), (3, "Ulysses")] {
        let mut record = Value::map();
        record.set_field("id", Value::from(id)).unwrap();
        record.set_field("title", Value::from(title)).unwrap();
        store.put(record, None);
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let titles = store.get_all(Some(KeyRange::lower_bound(2, false)));
    let sink = seen.clone();
    titles.on_success(move |records| {
        for record in records {
            let title = record.field("title").and_then(Value::as_str).unwrap();
            sink.borrow_mut().push(title.to_string());
        }
    });

    assert!(seen.borrow().is_empty());
    env.run_until_idle();
    assert_eq!(*seen.borrow(), vec!["Emma".to_string(), "Ulysses".to_string()]);

    let count = store.count(None);
    env.run_until_idle();
    assert_eq!(count.result(), Some(3));

    let key = store.get_all_keys(Some(KeyRange::only(3)));
    env.run_until_idle();
    assert_eq!(key.result(), Some(vec![Key::Number(3)]));
}

#[test]
fn fetch_is_refused_without_a_proxy() {
    let env = Environment::sandbox();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let request = FetchRequest::get("https://example.com/data").unwrap();
    let err = runtime.block_on(env.fetch(request)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(err.message().starts_with("fetch is not implemented in the sandbox"));
}

struct Echo;

#[async_trait(?Send)]
impl FetchProxy for Echo {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError> {
        Ok(FetchResponse::new(200, request.url.to_string()))
    }
}

#[tokio::test]
async fn custom_proxies_serve_fetch() {
    let env = Environment::with_host(SandboxHost::with_proxy(Echo));

    let response = env
        .fetch(FetchRequest::get("https://example.com/echo").unwrap())
        .await
        .unwrap();

    assert!(response.ok());
    assert_eq!(response.text(), "https://example.com/echo");
    assert_eq!(env.host().random_uuid().len(), 36);
}

#[tokio::test]
async fn bridge_records_land_in_the_environment() {
    let env = Environment::sandbox();
    let bridge = Bridge::new(env.memory_client_factory());
    let mut session = Session::new();

    let config = InitConfig::default()
        .with_store_config(json!({"spaces": [{"did": "did:key:space"}]}))
        .with_space("did:key:space");
    assert!(bridge.initialize(&mut session, config).await.is_success());

    let uploaded = bridge
        .upload_single_item(&session, Bytes::from_static(b"payload"), "p.bin")
        .await;
    assert!(uploaded.is_success());

    assert!(bridge
        .authenticate(&session, "dev@example.org")
        .await
        .is_success());

    assert!(env
        .indexed_db()
        .database_names()
        .contains(&"hostshim-uploads".to_string()));
    assert!(env.local_storage().get_item("hostshim.accounts").is_some());
    assert_eq!(env.queue().pending(), 0);
}

#[tokio::test]
async fn bridge_calls_leave_later_host_work_queued() {
    let env = Environment::sandbox();
    let bridge = Bridge::new(env.memory_client_factory());
    let mut session = Session::new();
    let config = InitConfig::default()
        .with_store_config(json!({"spaces": [{"did": "did:key:space"}]}))
        .with_space("did:key:space");
    assert!(bridge.initialize(&mut session, config).await.is_success());
    assert!(bridge.list_uploads(&session, None, None).await.is_success());

    let log = Rc::new(RefCell::new(Vec::new()));
    let timers = env.timers().clone();
    let first = Rc::clone(&log);
    env.timers().queue_microtask(move || {
        first.borrow_mut().push("queued before");
        let second = Rc::clone(&first);
        timers.queue_microtask(move || second.borrow_mut().push("queued during"));
    });

    let uploaded = bridge
        .upload_single_item(&session, Bytes::from_static(b"x"), "x.bin")
        .await;
    assert!(uploaded.is_success());

    assert_eq!(*log.borrow(), vec!["queued before"]);
    assert_eq!(env.queue().pending(), 1);
    env.run_until_idle();
    assert_eq!(*log.borrow(), vec!["queued before", "queued during"]);
}
