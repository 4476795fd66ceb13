use bytes::Bytes;
use hostshim_bridge::payload::ByteInput;
use hostshim_bridge::{
    Bridge, BridgeCall, ErrorKind, InitConfig, MemoryClient, MemoryClientFactory, Session,
};
use serde_json::{json, Value};

const SPACE: &str = "did:key:z6Mk-space";

fn store_config() -> Value {
    json!({
        "accounts": ["did:mailto:example.com:ops"],
        "spaces": [{"did": SPACE, "name": "primary", "registered": true}],
        "pageSize": 10,
    })
}

fn bridge() -> Bridge<MemoryClientFactory> {
    Bridge::new(MemoryClientFactory::standalone())
}

async fn ready_session(bridge: &Bridge<MemoryClientFactory>) -> Session<MemoryClient> {
    let mut session = Session::new();
    let envelope = bridge
        .initialize(
            &mut session,
            InitConfig::default()
                .with_store_config(store_config())
                .with_space(SPACE),
        )
        .await;
    assert!(envelope.is_success(), "{:?}", envelope);
    session
}

#[tokio::test]
async fn operations_before_initialize_fail() {
    let bridge = bridge();
    let session = Session::new();

    let envelopes = vec![
        bridge.authenticate(&session, "a@b.c").await.to_json(),
        bridge.identify_current_user(&session).await.to_json(),
        bridge.list_spaces(&session).await.to_json(),
        bridge
            .upload_single_item(&session, Bytes::from_static(b"x"), "x")
            .await
            .to_json(),
        bridge.upload_collection(&session, Vec::new()).await.to_json(),
        bridge.list_uploads(&session, None, None).await.to_json(),
        bridge.remove_upload(&session, "bafy").await.to_json(),
    ];

    for envelope in envelopes {
        assert_eq!(
            envelope,
            json!({
                "success": false,
                "error": "Client not initialized",
                "kind": "InitializationError",
            })
        );
    }
}

#[tokio::test]
async fn upload_without_space_is_a_state_error() {
    let bridge = bridge();
    let mut session = Session::new();
    let envelope = bridge
        .initialize(&mut session, InitConfig::default().with_store_config(store_config()))
        .await;
    assert!(envelope.is_success());
    assert_eq!(session.current_space(), None);

    let envelope = bridge
        .upload_single_item(&session, Bytes::from_static(b"data"), "a.txt")
        .await;
    assert_eq!(envelope.kind(), Some(ErrorKind::State));
    assert_eq!(envelope.error(), Some("No space selected"));
}

#[tokio::test]
async fn unknown_space_keeps_new_client() {
    let bridge = bridge();
    let mut session = ready_session(&bridge).await;
    assert_eq!(session.current_space(), Some(SPACE));

    let envelope = bridge
        .initialize(
            &mut session,
            InitConfig::default()
                .with_store_config(store_config())
                .with_space("did:key:missing"),
        )
        .await;

    assert_eq!(envelope.kind(), Some(ErrorKind::NotFound));
    assert_eq!(envelope.error(), Some("Space did:key:missing not found"));
    assert!(session.is_initialized());
    assert_eq!(session.current_space(), None);
}

#[tokio::test]
async fn identity_and_spaces() {
    let bridge = bridge();
    let session = ready_session(&bridge).await;

    let envelope = bridge.authenticate(&session, "alice@example.com").await;
    assert!(envelope.is_success());

    assert_eq!(
        bridge.identify_current_user(&session).await.to_json(),
        json!({
            "success": true,
            "accounts": [
                {"did": "did:mailto:example.com:ops"},
                {"did": "did:mailto:example.com:alice"},
            ],
        })
    );
    assert_eq!(
        bridge.list_spaces(&session).await.to_json(),
        json!({
            "success": true,
            "spaces": [{"did": SPACE, "name": "primary", "registered": true}],
        })
    );

    let envelope = bridge.authenticate(&session, "nobody").await;
    assert_eq!(envelope.kind(), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn upload_list_and_remove() {
    let bridge = bridge();
    let session = ready_session(&bridge).await;

    let single = bridge
        .upload_single_item(&session, Bytes::from_static(b"hello"), "hello.txt")
        .await;
    let single_cid = single.payload().unwrap().cid.clone();

    let collection = bridge
        .upload_collection(
            &session,
            vec![
                (Bytes::from_static(b"1"), "one.txt".to_string()),
                (Bytes::from_static(b"2"), "two.txt".to_string()),
            ],
        )
        .await;
    let collection_cid = collection.payload().unwrap().cid.clone();
    assert_ne!(single_cid, collection_cid);

    // An empty cursor and a zero size are ignored.
    let listing = bridge
        .list_uploads(&session, Some(String::new()), Some(0))
        .await;
    let listing = listing.payload().unwrap();
    assert_eq!(listing.size, 2);
    assert!(listing.cursor.is_none());

    let first_page = bridge.list_uploads(&session, None, Some(1)).await;
    let first_page = first_page.payload().unwrap();
    assert_eq!(first_page.size, 1);
    let cursor = first_page.cursor.clone().unwrap();

    let second_page = bridge.list_uploads(&session, Some(cursor), Some(1)).await;
    let second_page = second_page.payload().unwrap();
    assert_eq!(second_page.size, 1);
    assert_ne!(second_page.uploads[0].root, first_page.uploads[0].root);

    assert!(bridge.remove_upload(&session, &single_cid).await.is_success());
    let missing = bridge.remove_upload(&session, &single_cid).await;
    assert_eq!(missing.kind(), Some(ErrorKind::NotFound));

    let listing = bridge.list_uploads(&session, None, None).await;
    let roots: Vec<_> = listing
        .payload()
        .unwrap()
        .uploads
        .iter()
        .map(|u| u.root.clone())
        .collect();
    assert_eq!(roots, vec![collection_cid]);
}

#[tokio::test]
async fn json_calls_round_trip_through_the_dispatcher() {
    let bridge = bridge();
    let mut session = Session::new();

    let response = bridge
        .call(&mut session, json!({"operation": "listSpaces"}))
        .await;
    assert_eq!(response["kind"], "InitializationError");

    let response = bridge
        .call(
            &mut session,
            json!({
                "operation": "initClient",
                "args": {"store": store_config(), "spaceDID": SPACE},
            }),
        )
        .await;
    assert_eq!(response, json!({"success": true}));

    let response = bridge
        .call(
            &mut session,
            json!({
                "operation": "uploadFile",
                "args": {"data": "aGVsbG8=", "name": "hello.txt"},
            }),
        )
        .await;
    assert_eq!(response["success"], true);
    let cid = response["cid"].as_str().unwrap().to_string();

    let response = bridge
        .call(
            &mut session,
            json!({
                "operation": "uploadSingleItem",
                "args": {"data": [104, 101, 108, 108, 111], "name": "hello.txt"},
            }),
        )
        .await;
    assert_eq!(response["cid"], cid.as_str());

    let response = bridge
        .call(&mut session, json!({"operation": "listUploads", "args": {}}))
        .await;
    assert_eq!(response["size"], 1);
    assert_eq!(response["uploads"][0]["root"], cid.as_str());

    let response = bridge
        .call(
            &mut session,
            json!({"operation": "removeUpload", "args": {"cid": cid}}),
        )
        .await;
    assert_eq!(response, json!({"success": true}));
}

#[tokio::test]
async fn json_failures_are_envelopes() {
    let bridge = bridge();
    let mut session = ready_session(&bridge).await;

    let response = bridge
        .call(&mut session, json!({"operation": "formatDisk"}))
        .await;
    assert_eq!(response["success"], false);
    assert_eq!(response["kind"], "UnsupportedOperationError");

    let response = bridge.call(&mut session, json!(42)).await;
    assert_eq!(response["kind"], "ValidationError");

    let response = bridge
        .call(
            &mut session,
            json!({"operation": "uploadFile", "args": {"data": "abcde", "name": "x"}}),
        )
        .await;
    assert_eq!(response["kind"], "ValidationError");

    let response = bridge
        .call(
            &mut session,
            json!({"operation": "initialize", "args": {"store": {"pageSize": "lots"}}}),
        )
        .await;
    assert_eq!(response["kind"], "ValidationError");
}

#[tokio::test]
async fn json_calls_before_initialize_are_uninitialized_whatever_the_args() {
    let bridge = bridge();
    let mut session = Session::new();

    let requests = vec![
        json!({"operation": "uploadFile", "args": {"data": "abcde", "name": "x"}}),
        json!({"operation": "uploadDirectory", "args": {"items": [{"data": "a", "name": "y"}]}}),
        json!({"operation": "removeUpload", "args": {}}),
        json!({"operation": "login"}),
        json!({"operation": "listUploads", "args": {"size": -1}}),
    ];
    for request in requests {
        let response = bridge.call(&mut session, request).await;
        assert_eq!(
            response,
            json!({
                "success": false,
                "error": "Client not initialized",
                "kind": "InitializationError",
            })
        );
    }

    // Unknown names and malformed requests are still reported as such.
    let response = bridge.call(&mut session, json!({"operation": "formatDisk"})).await;
    assert_eq!(response["kind"], "UnsupportedOperationError");
    let response = bridge.call(&mut session, json!([])).await;
    assert_eq!(response["kind"], "ValidationError");
}

#[tokio::test]
async fn typed_upload_with_bad_bytes_before_initialize_is_uninitialized() {
    let bridge = bridge();
    let mut session = Session::new();

    let call = BridgeCall::UploadSingleItem {
        data: ByteInput::Base64("abcde".to_string()),
        name: "x".to_string(),
    };
    let response = bridge.dispatch(&mut session, call).await;
    assert_eq!(response["kind"], "InitializationError");
}
