use http::Method;
use jsonecho::common::spawn_test_server;
use jsonecho::http::{Request, parse_json_body};
use jsonecho::{EchoResponse, HttpConfig, HttpEchoClient};
use proptest::prelude::*;
use serde_json::Value;

fn supported_method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::GET),
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::DELETE),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the echo carries the method and target exactly as received
    #[test]
    fn echo_preserves_method_and_path(
        method in supported_method(),
        path in "/[A-Za-z0-9%._~?=&/+-]{0,40}",
    ) {
        let echo = EchoResponse::from_request(&Request::new(method.clone(), path.clone()));
        prop_assert_eq!(echo.method, method.as_str());
        prop_assert_eq!(echo.path, path);
    }

    /// Property: every header name appears once, carrying the last value sent for it
    #[test]
    fn echo_headers_reflect_last_value(
        headers in prop::collection::vec(("[A-Za-z][A-Za-z0-9-]{0,8}", "[ -~]{0,20}"), 0..12),
    ) {
        let request = headers.iter().fold(Request::new(Method::GET, "/"), |req, (n, v)| {
            req.with_header(n.clone(), v.clone())
        });
        let echo = EchoResponse::from_request(&request);

        for (name, _) in &headers {
            let last = headers
                .iter()
                .rev()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| Value::String(v.clone()))
                .unwrap();
            let matching: Vec<&Value> = echo
                .headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
                .collect();
            prop_assert_eq!(matching, vec![&last]);
        }
    }

    /// Property: `json` is present exactly when the body is non-empty valid JSON
    #[test]
    fn json_field_matches_body_validity(body in ".{0,64}") {
        let echo = EchoResponse::from_request(&Request::new(Method::POST, "/").with_body(body.clone()));
        let expected = if body.is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(&body).ok()
        };

        prop_assert_eq!(&echo.body, &body);
        prop_assert_eq!(echo.json.is_some(), expected.is_some());
        prop_assert_eq!(echo.json, expected);
    }

    /// Property: any serialized JSON value round-trips through the body parser
    #[test]
    fn json_bodies_are_decoded(value in json_value()) {
        let body = serde_json::to_vec(&value).unwrap();
        prop_assert_eq!(parse_json_body(&body), Some(value));
    }
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,10}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property: the server echoes method, path and body over a real connection
    #[test]
    fn server_echoes_over_the_wire(
        method in supported_method(),
        path in "/[A-Za-z0-9%._~?=&/-]{0,40}",
        body in "[ -~]{0,64}",
    ) {
        tokio_test::block_on(async {
            let (server_handle, addr) = spawn_test_server(HttpConfig::default()).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {}", e)))?;

            let mut client = HttpEchoClient::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;

            let request = Request::new(method.clone(), path.clone()).with_body(body.clone());
            let echo = client.echo(request).await
                .map_err(|e| TestCaseError::fail(format!("Echo failed: {}", e)))?;

            server_handle.abort();

            prop_assert_eq!(echo.method, method.as_str());
            prop_assert_eq!(echo.path, path);
            prop_assert_eq!(echo.body, body);
            Ok(())
        })?;
    }
}
