//! Custom order and order lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives a `Session` whose
//! transport executes requests over real HTTP using ureq. Validates that the
//! core's request building, response parsing, and custom order flow work
//! end-to-end with the actual server.

use hashicups_core::{
    ApiError, Coffee, HashicupsClient, HttpMethod, HttpRequest, HttpResponse, HttpTransport, Ingredient,
    OrderItem, Session, SignInRequest, ValidationError,
};

/// Executes `HttpRequest`s with a ureq agent.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&mut self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let header = |name: &str| {
            req.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        let auth = header("authorization");

        let result = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let mut r = self.agent.get(&req.path);
                if let Some(token) = &auth {
                    r = r.header("authorization", token);
                }
                r.call()
            }
            (HttpMethod::Delete, _) => {
                let mut r = self.agent.delete(&req.path);
                if let Some(token) = &auth {
                    r = r.header("authorization", token);
                }
                r.call()
            }
            (HttpMethod::Post, body) => {
                let mut r = self.agent.post(&req.path).content_type("application/json");
                if let Some(token) = &auth {
                    r = r.header("authorization", token);
                }
                r.send(body.unwrap_or_default().as_bytes())
            }
            (HttpMethod::Put, body) => {
                let mut r = self.agent.put(&req.path).content_type("application/json");
                if let Some(token) = &auth {
                    r = r.header("authorization", token);
                }
                r.send(body.unwrap_or_default().as_bytes())
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn session(base_url: &str) -> Session<UreqTransport> {
    Session::new(HashicupsClient::new(base_url), UreqTransport::new())
}

#[test]
fn custom_order_lifecycle() {
    let base_url = start_server();
    let mut session = session(&base_url);

    // Step 1: sign in.
    let auth = session
        .sign_in(&SignInRequest {
            username: "education".to_string(),
            password: "test123".to_string(),
        })
        .unwrap();
    assert!(!auth.token.is_empty());

    // Step 2: order a customized Vaulatte.
    let items = vec![OrderItem::new(
        Coffee::customized(3, "VaulatteX", vec![Ingredient::new(10, 60), Ingredient::new(99, 5)]),
        2,
    )];
    let order = session.create_custom_order(&items).unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    let variant_id = order.items[0].coffee.id;
    assert_ne!(variant_id, 3);
    assert_eq!(order.items[0].coffee.name, "VaulatteX");

    // Step 3: the variant carries the customized recipe; unknown override dropped.
    let ingredients = session.get_coffee_ingredients(variant_id).unwrap();
    let quantities: Vec<(i64, i64)> = ingredients.iter().map(|i| (i.id, i.quantity)).collect();
    assert_eq!(quantities, vec![(10, 60), (11, 300)]);
    assert_eq!(ingredients[0].extra["Name"], "Espresso");

    // Step 4: the canonical recipe is untouched.
    let canonical = session.get_coffee_ingredients(3).unwrap();
    let quantities: Vec<(i64, i64)> = canonical.iter().map(|i| (i.id, i.quantity)).collect();
    assert_eq!(quantities, vec![(10, 40), (11, 300)]);

    // Step 5: the variant is in the catalog next to the original.
    let coffees = session.get_coffees().unwrap();
    assert!(coffees.iter().any(|c| c.id == variant_id && c.name == "VaulatteX"));
    assert!(coffees.iter().any(|c| c.id == 3 && c.name == "Vaulatte"));

    // Step 6: get the order.
    let fetched = session.get_order(&order.id).unwrap();
    assert_eq!(fetched, order);

    // Step 7: update replaces the items.
    let updated = session
        .update_order(&order.id, &[OrderItem::new(Coffee::reference(1), 3)])
        .unwrap();
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].coffee.id, 1);
    assert_eq!(updated.items[0].quantity, 3);

    // Step 8: delete.
    session.delete_order(&order.id).unwrap();

    // Step 9: get after delete — should be NotFound.
    let err = session.get_order(&order.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 10: delete again — should be NotFound.
    let err = session.delete_order(&order.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn rejected_customization_writes_nothing() {
    let base_url = start_server();
    let mut session = session(&base_url);
    let before = session.get_coffees().unwrap().len();

    let items = vec![OrderItem::new(Coffee::customized(3, "Vaulatte", vec![]), 1)];
    let err = session.create_custom_order(&items).unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::SameName { .. })));

    assert_eq!(session.get_coffees().unwrap().len(), before);
}

#[test]
fn unknown_coffee_is_an_ingredient_fetch_error() {
    let base_url = start_server();
    let mut session = session(&base_url);
    let before = session.get_coffees().unwrap().len();

    let items = vec![OrderItem::new(Coffee::customized(42, "Mystery", vec![]), 1)];
    match session.create_custom_order(&items).unwrap_err() {
        ApiError::IngredientFetch { coffee_id, source } => {
            assert_eq!(coffee_id, 42);
            assert!(matches!(*source, ApiError::NotFound));
        }
        other => panic!("expected IngredientFetch, got {other:?}"),
    }

    assert_eq!(session.get_coffees().unwrap().len(), before);
}

#[test]
fn unreachable_server_is_a_catalog_fetch_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut session = session(&format!("http://{addr}"));
    let items = vec![OrderItem::new(Coffee::customized(3, "VaulatteX", vec![]), 1)];
    let err = session.create_custom_order(&items).unwrap_err();
    match err {
        ApiError::CatalogFetch(source) => assert!(matches!(*source, ApiError::Transport(_))),
        other => panic!("expected CatalogFetch, got {other:?}"),
    }
}
