use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::{DELETE, GET, POST, PUT};
use httpmock::MockServer;
use parking_lot::Mutex;
use rstest::*;
use serde_json::json;

use intent_bench::backend::{
    ApiaiAdapter, Credentials, LuisAdapter, RecastAdapter, RecastCredentials,
    VendorAdapterFactory,
};
use intent_bench::classifier::{
    AdapterFactory, ClassifierAdapter, ParamValue, Parameters, PollPolicy, Sleeper,
    TrainingPoller,
};
use intent_bench::dataset::Example;
use intent_bench::error::BenchError;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Records requested sleeps instead of blocking.
#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

#[fixture]
fn mock_server() -> MockServer {
    MockServer::start()
}

#[fixture]
fn sleeper() -> Arc<RecordingSleeper> {
    Arc::new(RecordingSleeper::default())
}

fn poller(sleeper: &Arc<RecordingSleeper>, max_polls: Option<usize>) -> TrainingPoller {
    let policy = PollPolicy {
        interval: Duration::from_millis(250),
        max_polls,
    };
    TrainingPoller::new(policy, sleeper.clone())
}

fn training_set() -> Vec<Example> {
    vec![
        Example::new("hello", "greeting"),
        Example::new("good morning", "greeting"),
        Example::new("goodbye", "farewell"),
    ]
}

#[rstest]
fn apiai_fit_replaces_intents_and_adds_fallback(
    mock_server: MockServer,
    sleeper: Arc<RecordingSleeper>,
) {
    let list = mock_server.mock(|when, then| {
        when.method(GET)
            .path("/intents")
            .header("authorization", "Bearer agent-token");
        then.status(200)
            .json_body(json!([{"id": "42", "name": "stale"}]));
    });
    let delete = mock_server.mock(|when, then| {
        when.method(DELETE).path("/intents/42");
        then.status(200).json_body(json!({"status": {"code": 200}}));
    });
    let fallback = mock_server.mock(|when, then| {
        when.method(POST)
            .path("/intents")
            .json_body_partial(r#"{"name": "none", "fallbackIntent": true}"#);
        then.status(200).json_body(json!({"id": "f"}));
    });
    let greeting = mock_server.mock(|when, then| {
        when.method(POST).path("/intents").json_body_partial(
            r#"{"name": "greeting", "templates": ["hello", "good morning"], "fallbackIntent": false}"#,
        );
        then.status(200).json_body(json!({"id": "g"}));
    });
    let farewell = mock_server.mock(|when, then| {
        when.method(POST)
            .path("/intents")
            .json_body_partial(r#"{"name": "farewell", "templates": ["goodbye"]}"#);
        then.status(200).json_body(json!({"id": "b"}));
    });

    let mut adapter = ApiaiAdapter::new(
        &mock_server.base_url(),
        "agent-token",
        "en",
        "none",
        poller(&sleeper, None),
        TIMEOUT,
    )
    .unwrap()
    .with_settle_delay(Duration::from_secs(2));

    adapter.fit(&training_set()).unwrap();

    list.assert();
    delete.assert();
    greeting.assert();
    farewell.assert();
    fallback.assert();
    assert_eq!(*sleeper.sleeps.lock(), vec![Duration::from_secs(2)]);
}

#[rstest]
fn apiai_empty_action_maps_to_fallback(mock_server: MockServer, sleeper: Arc<RecordingSleeper>) {
    mock_server.mock(|when, then| {
        when.method(POST)
            .path("/query")
            .json_body_partial(r#"{"query": "hello", "lang": "en"}"#);
        then.status(200)
            .json_body(json!({"result": {"action": "greeting"}}));
    });
    mock_server.mock(|when, then| {
        when.method(POST)
            .path("/query")
            .json_body_partial(r#"{"query": "qwerty"}"#);
        then.status(200).json_body(json!({"result": {"action": ""}}));
    });

    let mut adapter = ApiaiAdapter::new(
        &mock_server.base_url(),
        "agent-token",
        "en",
        "none",
        poller(&sleeper, None),
        TIMEOUT,
    )
    .unwrap();

    let predictions = adapter.predict(&["hello", "qwerty"]).unwrap();
    assert_eq!(predictions, vec!["greeting", "none"]);
    assert!(adapter.predict(&[]).unwrap().is_empty());
}

#[rstest]
fn apiai_error_status_surfaces_backend_message(
    mock_server: MockServer,
    sleeper: Arc<RecordingSleeper>,
) {
    mock_server.mock(|when, then| {
        when.method(GET).path("/intents");
        then.status(401).json_body(
            json!({"status": {"code": 401, "errorType": "unauthorized", "errorDetails": "bad token"}}),
        );
    });

    let mut adapter = ApiaiAdapter::new(
        &mock_server.base_url(),
        "wrong",
        "en",
        "none",
        poller(&sleeper, None),
        TIMEOUT,
    )
    .unwrap();

    match adapter.fit(&training_set()).unwrap_err() {
        BenchError::Backend {
            backend,
            status,
            message,
        } => {
            assert_eq!(backend, "apiai");
            assert_eq!(status, 401);
            assert_eq!(message, "bad token");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn luis_adapter(
    server: &MockServer,
    sleeper: &Arc<RecordingSleeper>,
    max_polls: Option<usize>,
) -> LuisAdapter {
    LuisAdapter::new(
        &server.base_url(),
        "sub-key",
        "en-us",
        "none",
        poller(sleeper, max_polls),
        TIMEOUT,
    )
    .unwrap()
}

fn mock_luis_app(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1.0/prog/apps")
            .query_param("subscription-key", "sub-key")
            .json_body_partial(r#"{"Culture": "en-us"}"#);
        then.status(201).json_body(json!("app-1"));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1.0/prog/apps/app-1/intents");
        then.status(201).json_body(json!("intent-id"));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1.0/prog/apps/app-1/example");
        then.status(201).json_body(json!({"ExampleId": 1}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1.0/prog/apps/app-1/train");
        then.status(202).body("");
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1.0/prog/apps/app-1/publish");
        then.status(201).json_body(json!({"EndpointUrl": "x"}));
    });
}

#[rstest]
fn luis_fit_trains_publishes_and_predicts(mock_server: MockServer, sleeper: Arc<RecordingSleeper>) {
    mock_luis_app(&mock_server);
    let status = mock_server.mock(|when, then| {
        when.method(GET).path("/v1.0/prog/apps/app-1/train");
        then.status(200).json_body(json!([
            {"ModelId": "a", "Details": {"Status": "Success"}},
            {"ModelId": "b", "Details": {"Status": "Up to date"}}
        ]));
    });
    mock_server.mock(|when, then| {
        when.method(GET)
            .path("/v1/application")
            .query_param("id", "app-1")
            .query_param("q", "hello");
        then.status(200)
            .json_body(json!({"query": "hello", "intents": [{"intent": "greeting", "score": 0.9}]}));
    });
    mock_server.mock(|when, then| {
        when.method(GET)
            .path("/v1/application")
            .query_param("q", "qwerty");
        then.status(200)
            .json_body(json!({"query": "qwerty", "intents": [{"intent": "None", "score": 0.6}]}));
    });

    let mut adapter = luis_adapter(&mock_server, &sleeper, None);
    assert!(adapter.predict(&["hello"]).is_err());

    adapter.fit(&training_set()).unwrap();
    status.assert_hits(1);
    assert_eq!(adapter.app_id(), Some("app-1"));
    assert!(sleeper.sleeps.lock().is_empty());

    let predictions = adapter.predict(&["hello", "qwerty"]).unwrap();
    assert_eq!(predictions, vec!["greeting", "none"]);
}

#[rstest]
fn luis_refit_deletes_the_previous_app(mock_server: MockServer, sleeper: Arc<RecordingSleeper>) {
    mock_luis_app(&mock_server);
    mock_server.mock(|when, then| {
        when.method(GET).path("/v1.0/prog/apps/app-1/train");
        then.status(200)
            .json_body(json!([{"Details": {"Status": "Success"}}]));
    });
    let delete = mock_server.mock(|when, then| {
        when.method(DELETE).path("/v1.0/prog/apps/app-1");
        then.status(200).body("");
    });

    let mut adapter = luis_adapter(&mock_server, &sleeper, None);
    adapter.fit(&training_set()).unwrap();
    delete.assert_hits(0);
    adapter.fit(&training_set()).unwrap();
    delete.assert_hits(1);
}

#[rstest]
#[case::reported_failure(json!([{"Details": {"Status": "Fail", "FailureReason": "FewLabels"}}]), None, "FewLabels")]
#[case::poll_bound(json!([{"Details": {"Status": "InProgress"}}]), Some(3), "after 3 polls")]
fn luis_training_errors(
    #[case] status: serde_json::Value,
    #[case] max_polls: Option<usize>,
    #[case] reason: &str,
    mock_server: MockServer,
    sleeper: Arc<RecordingSleeper>,
) {
    mock_luis_app(&mock_server);
    mock_server.mock(|when, then| {
        when.method(GET).path("/v1.0/prog/apps/app-1/train");
        then.status(200).json_body(status);
    });

    let mut adapter = luis_adapter(&mock_server, &sleeper, max_polls);
    let err = adapter.fit(&training_set()).unwrap_err();

    assert!(matches!(err, BenchError::Training { .. }), "{err}");
    assert!(err.to_string().contains(reason), "{err}");
}

#[rstest]
fn luis_query_retries_undecodable_answers(mock_server: MockServer, sleeper: Arc<RecordingSleeper>) {
    mock_luis_app(&mock_server);
    mock_server.mock(|when, then| {
        when.method(GET).path("/v1.0/prog/apps/app-1/train");
        then.status(200)
            .json_body(json!([{"Details": {"Status": "Success"}}]));
    });
    let query = mock_server.mock(|when, then| {
        when.method(GET).path("/v1/application");
        then.status(200).body("{\"intents\": [");
    });

    let mut adapter = luis_adapter(&mock_server, &sleeper, None);
    adapter.fit(&training_set()).unwrap();

    let err = adapter.predict(&["hello"]).unwrap_err();
    assert!(err.is_transient());
    query.assert_hits(3);
}

fn recast_adapter(server: &MockServer) -> RecastAdapter {
    RecastAdapter::new(
        &server.base_url(),
        "me",
        "bench",
        "bot-token",
        "en",
        "none",
        TIMEOUT,
    )
    .unwrap()
}

#[rstest]
fn recast_fit_pushes_strictness_and_recreates_intents(mock_server: MockServer) {
    let bot = mock_server.mock(|when, then| {
        when.method(PUT)
            .path("/users/me/bots/bench")
            .header("authorization", "Token bot-token")
            .json_body(json!({"name": "bench", "strictness": 80}));
        then.status(200).json_body(json!({"results": {}}));
    });
    mock_server.mock(|when, then| {
        when.method(GET).path("/users/me/bots/bench/intents");
        then.status(200)
            .json_body(json!({"results": [{"slug": "old-one"}, {"slug": "old-two"}]}));
    });
    let deletes = mock_server.mock(|when, then| {
        when.method(DELETE).path_contains("/users/me/bots/bench/intents/old-");
        then.status(200).json_body(json!({"results": null}));
    });
    let creates = mock_server.mock(|when, then| {
        when.method(POST)
            .path("/users/me/bots/bench/intents")
            .body_contains("\"isocode\":\"en\"");
        then.status(201).json_body(json!({"results": {}}));
    });

    let mut adapter = recast_adapter(&mock_server).with_strictness(80);
    adapter.fit(&training_set()).unwrap();

    bot.assert();
    deletes.assert_hits(2);
    creates.assert_hits(2);
}

#[rstest]
fn recast_empty_intents_map_to_fallback(mock_server: MockServer) {
    mock_server.mock(|when, then| {
        when.method(POST).path("/request").body_contains("text=hello");
        then.status(200)
            .json_body(json!({"results": {"intents": [{"slug": "greeting", "confidence": 0.99}]}}));
    });
    mock_server.mock(|when, then| {
        when.method(POST).path("/request").body_contains("text=qwerty");
        then.status(200)
            .json_body(json!({"results": {"intents": []}}));
    });

    let mut adapter = recast_adapter(&mock_server);
    assert_eq!(
        adapter.predict(&["hello", "qwerty"]).unwrap(),
        vec!["greeting", "none"]
    );
}

#[rstest]
fn recast_intent_creation_retry_is_bounded(mock_server: MockServer) {
    mock_server.mock(|when, then| {
        when.method(PUT).path("/users/me/bots/bench");
        then.status(200).json_body(json!({}));
    });
    mock_server.mock(|when, then| {
        when.method(GET).path("/users/me/bots/bench/intents");
        then.status(200).json_body(json!({"results": []}));
    });
    let creates = mock_server.mock(|when, then| {
        when.method(POST).path("/users/me/bots/bench/intents");
        then.status(200).body("<html>gateway</html>");
    });

    let err = recast_adapter(&mock_server).fit(&training_set()).unwrap_err();
    assert!(err.is_transient());
    creates.assert_hits(4);
}

#[rstest]
fn factory_wires_credentials_and_strictness(mock_server: MockServer) {
    let bot = mock_server.mock(|when, then| {
        when.method(PUT)
            .path("/users/me/bots/bench")
            .json_body(json!({"name": "bench", "strictness": 25}));
        then.status(200).json_body(json!({}));
    });
    mock_server.mock(|when, then| {
        when.method(GET).path("/users/me/bots/bench/intents");
        then.status(200).json_body(json!({"results": []}));
    });
    mock_server.mock(|when, then| {
        when.method(POST).path("/users/me/bots/bench/intents");
        then.status(201).json_body(json!({}));
    });

    let credentials = Credentials {
        recast: Some(RecastCredentials {
            user_slug: "me".to_string(),
            bot_slug: "bench".to_string(),
            token: "bot-token".to_string(),
            base_url: Some(mock_server.base_url()),
        }),
        ..Credentials::default()
    };
    let factory = VendorAdapterFactory::new(credentials, "none").with_timeout(TIMEOUT);
    let params = Parameters::from([("strictness".to_string(), ParamValue::Integer(25))]);

    let mut adapter = factory.build("recast", "en", &params).unwrap();
    assert_eq!(adapter.name(), "recast");
    adapter.fit(&training_set()).unwrap();
    bot.assert();

    let err = factory.build("luis", "en", &Parameters::new()).err().expect("expected build error");
    assert!(err.is_config());
}
