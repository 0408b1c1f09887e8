// self
use yuntan_gateway::{
	_preludet::*,
	config::GatewayConfig,
	service::{CoinService, FileService, UserService},
	sign,
	value::{Value, map},
};

fn config() -> GatewayConfig {
	GatewayConfig::builder("K")
		.host("https://api.test/")
		.secret("S")
		.build()
		.expect("Service config should be valid.")
}

#[tokio::test]
async fn file_service_maps_names_to_file_paths() {
	let (client, transport) =
		build_recording_client(config(), RecordingHttpClient::text(200, "file-bytes"));
	let files = FileService::new(client);
	let response = files.get("a.txt").await.expect("Download should succeed.");

	assert_eq!(response.body(), &Bytes::from_static(b"file-bytes"));

	files.put("a.bin", vec![0_u8, 255, 1]).await.expect("Upload should succeed.");
	files.remove("a.bin").await.expect("Removal should succeed.");

	let requests = transport.requests();

	assert_eq!(requests.len(), 3);
	assert_eq!(requests[0].method, Method::GET);
	assert_eq!(requests[0].uri, "https://api.test/file/a.txt");
	assert_eq!(requests[0].header("x-request-signature"), None);
	assert_eq!(requests[1].method, Method::PUT);
	assert_eq!(requests[1].header("content-type"), Some("application/x-raw-data"));

	let timestamp: i64 = requests[1]
		.header("x-request-time")
		.expect("Signed uploads carry X-REQUEST-TIME.")
		.parse()
		.expect("X-REQUEST-TIME is numeric.");
	let expected = sign::sign_param(
		b"S",
		&map([
			("raw", Value::from(vec![0_u8, 255, 1])),
			("pathname", Value::from("/file/a.bin")),
			("key", Value::from("K")),
			("timestamp", Value::from(timestamp)),
		]),
	);

	assert_eq!(requests[1].header("x-request-signature"), Some(expected.as_str()));
	assert_eq!(requests[1].body, Bytes::from_static(&[0, 255, 1]));
	assert_eq!(requests[2].method, Method::DELETE);
	assert!(requests[2].header("x-request-signature").is_some());
}

#[tokio::test]
async fn file_names_with_spaces_are_percent_encoded_on_the_wire() {
	let (client, transport) = build_recording_client(config(), RecordingHttpClient::text(200, "ok"));
	let files = FileService::new(client);

	files.put("my file.txt", vec![1_u8]).await.expect("Upload with a spaced name should succeed.");

	let request = transport.last_request().expect("Upload was recorded.");
	let timestamp: i64 = request
		.header("x-request-time")
		.expect("Signed uploads carry X-REQUEST-TIME.")
		.parse()
		.expect("X-REQUEST-TIME is numeric.");
	let expected = sign::sign_param(
		b"S",
		&map([
			("raw", Value::from(vec![1_u8])),
			("pathname", Value::from("/file/my file.txt")),
			("key", Value::from("K")),
			("timestamp", Value::from(timestamp)),
		]),
	);

	assert_eq!(request.uri, "https://api.test/file/my%20file.txt");
	assert_eq!(request.header("x-request-signature"), Some(expected.as_str()));
}

#[tokio::test]
async fn coin_service_signs_reads_and_selects_score() {
	let (client, transport) =
		build_recording_client(config(), RecordingHttpClient::json(r#"{"score":42,"name":"alice"}"#));
	let coins = CoinService::new(client);

	assert!(coins.client().config().secure);

	let score = coins.score("alice").await.expect("Score lookup should succeed.");

	assert_eq!(score, JsonValue::from(42));

	let saved = coins
		.save("alice", map([("score", Value::from(10)), ("type", Value::from("Incr"))]))
		.await
		.expect("Save should succeed.");

	assert_eq!(saved, JsonValue::from(42));

	let requests = transport.requests();

	assert_eq!(requests[0].method, Method::GET);
	assert_eq!(requests[0].uri, "https://api.test/api/coins/alice/score/");
	assert!(requests[0].header("x-request-signature").is_some());
	assert_eq!(requests[1].method, Method::POST);
	assert_eq!(requests[1].uri, "https://api.test/api/coins/alice/");
	assert_eq!(requests[1].body, Bytes::from_static(b"score=10&type=Incr"));
}

#[tokio::test]
async fn coin_service_queries_history_and_graphql() {
	let (client, transport) =
		build_recording_client(config(), RecordingHttpClient::json(r#"{"total":0,"coins":[]}"#));
	let coins = CoinService::new(client);
	let page = coins
		.history(map([("from", 0), ("size", 20)]))
		.await
		.expect("History should succeed.");

	assert_eq!(page["total"], JsonValue::from(0));

	coins.list("alice", map([("size", 5)])).await.expect("List should succeed.");
	coins.info("alice").await.expect("Info should succeed.");
	coins
		.put_info("alice", map([("level", "gold")]))
		.await
		.expect("Info update should succeed.");
	coins.drop_coin("alice").await.expect("Drop should succeed.");
	coins.graphql("{ coin(name: \"alice\") { score } }").await.expect("GraphQL should succeed.");
	coins.graphql_by_name("alice", "{ score }").await.expect("GraphQL should succeed.");

	let uris = transport.requests().into_iter().map(|r| (r.method, r.uri)).collect::<Vec<_>>();

	assert_eq!(uris, [
		(Method::GET, "https://api.test/api/coins_history/?size=20".to_owned()),
		(Method::GET, "https://api.test/api/coins/alice/?size=5".to_owned()),
		(Method::GET, "https://api.test/api/coins/alice/info/".to_owned()),
		(Method::PUT, "https://api.test/api/coins/alice/info/".to_owned()),
		(Method::POST, "https://api.test/api/coins/alice/drop/".to_owned()),
		(Method::POST, "https://api.test/api/graphql/".to_owned()),
		(Method::POST, "https://api.test/api/graphql/alice/".to_owned()),
	]);

	let put_info = &transport.requests()[3];

	assert_eq!(put_info.header("content-type"), Some("application/json"));
	assert_eq!(put_info.body, Bytes::from_static(br#"{"level":"gold"}"#));
}

#[tokio::test]
async fn user_service_covers_account_operations() {
	let (client, transport) =
		build_recording_client(config(), RecordingHttpClient::json(r#"{"result":"OK"}"#));
	let users = UserService::new(client);

	assert_eq!(users.list(0, 10).await.expect("List should succeed."), JsonValue::from("OK"));

	users.create("bob", "pw").await.expect("Create should succeed.");
	users.get("bob").await.expect("Get should succeed.");
	users.update_name("bob", "robert").await.expect("Rename should succeed.");
	users.update_passwd("robert", "pw2").await.expect("Password change should succeed.");
	users
		.update_extra("robert", &map([("age", 30)]))
		.await
		.expect("Extra update should succeed.");
	users.verify_passwd("robert", "pw2").await.expect("Verification should succeed.");
	users.graphql("{ user_count }").await.expect("GraphQL should succeed.");
	users.remove("robert").await.expect("Removal should succeed.");

	let requests = transport.requests();
	let summary = requests
		.iter()
		.map(|r| (r.method.as_str(), r.uri.as_str(), String::from_utf8_lossy(&r.body).into_owned()))
		.collect::<Vec<_>>();

	assert_eq!(summary, [
		("GET", "https://api.test/api/users/?size=10", String::new()),
		("POST", "https://api.test/api/users/", "passwd=pw&username=bob".to_owned()),
		("GET", "https://api.test/api/users/bob/", String::new()),
		("POST", "https://api.test/api/users/bob/", "username=robert".to_owned()),
		("POST", "https://api.test/api/users/robert/passwd", "passwd=pw2".to_owned()),
		("POST", "https://api.test/api/users/robert/extra", "extra=%7B%22age%22%3A30%7D".to_owned()),
		("POST", "https://api.test/api/users/robert/verify", "passwd=pw2".to_owned()),
		("POST", "https://api.test/api/graphql/", "query=%7B+user_count+%7D".to_owned()),
		("DELETE", "https://api.test/api/users/robert/", String::new()),
	]);
	assert!(requests.iter().all(|r| r.header("x-request-signature").is_some()));
}

#[tokio::test]
async fn user_service_surfaces_remote_errors() {
	let (client, _) = build_recording_client(
		config(),
		RecordingHttpClient::json(r#"{"err":"password not match"}"#),
	);
	let users = UserService::new(client);
	let err = users.verify_passwd("bob", "wrong").await.expect_err("Mismatch should fail.");

	assert_eq!(err.remote_message(), Some("password not match"));
}
