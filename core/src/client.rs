//! Stateless HTTP request builder and response parser for the HashiCups API.
//!
//! # Design
//! `HashicupsClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Executing the round trip is left to an `HttpTransport`;
//! `Session` glues the three together.
//!
//! The service answers 200 for every successful call, including creates.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthResponse, Coffee, Ingredient, Order, OrderItem, SignInRequest};

/// Body the service sends after a successful order deletion.
pub const DELETED_ORDER_CONFIRMATION: &str = "Deleted order";

/// Synchronous, stateless client for the HashiCups API.
#[derive(Debug, Clone)]
pub struct HashicupsClient {
    config: ClientConfig,
}

impl HashicupsClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = &self.config.token {
            headers.push(("authorization".to_string(), token.clone()));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.config.base_url),
            headers,
            body,
        }
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, path, Some(body)))
    }

    // -- coffees --

    pub fn build_get_coffees(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/coffees", None)
    }

    pub fn build_get_coffee_ingredients(&self, coffee_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/coffees/{coffee_id}/ingredients"), None)
    }

    pub fn build_create_coffee(&self, coffee: &Coffee) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/coffees", coffee)
    }

    /// Associate `ingredient` with `coffee`. Only the coffee's ID is used.
    pub fn build_create_coffee_ingredient(
        &self,
        coffee: &Coffee,
        ingredient: &Ingredient,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            &format!("/coffees/{}/ingredients", coffee.id),
            ingredient,
        )
    }

    pub fn parse_get_coffees(&self, response: HttpResponse) -> Result<Vec<Coffee>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_coffee_ingredients(&self, response: HttpResponse) -> Result<Vec<Ingredient>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_coffee(&self, response: HttpResponse) -> Result<Coffee, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_coffee_ingredient(&self, response: HttpResponse) -> Result<Ingredient, ApiError> {
        parse_json(response)
    }

    // -- orders --

    pub fn build_get_order(&self, order_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/orders/{order_id}"), None)
    }

    pub fn build_create_order(&self, items: &[OrderItem]) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/orders", items)
    }

    pub fn build_update_order(&self, order_id: &str, items: &[OrderItem]) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/orders/{order_id}"), items)
    }

    pub fn build_delete_order(&self, order_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/orders/{order_id}"), None)
    }

    pub fn parse_get_order(&self, response: HttpResponse) -> Result<Order, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_order(&self, response: HttpResponse) -> Result<Order, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_order(&self, response: HttpResponse) -> Result<Order, ApiError> {
        parse_json(response)
    }

    /// Succeeds only when the body is exactly `"Deleted order"`; any other
    /// body becomes `ApiError::Remote` carrying it verbatim.
    pub fn parse_delete_order(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)?;
        if response.body != DELETED_ORDER_CONFIRMATION {
            return Err(ApiError::Remote(response.body));
        }
        Ok(())
    }

    // -- auth --

    pub fn build_sign_in(&self, credentials: &SignInRequest) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/signin", credentials)
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_json(response)
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response, 200)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HashicupsClient {
        HashicupsClient::new("http://localhost:19090")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_coffees_produces_correct_request() {
        let req = client().build_get_coffees();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:19090/coffees");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_coffee_ingredients_uses_coffee_id() {
        let req = client().build_get_coffee_ingredients(3);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:19090/coffees/3/ingredients");
    }

    #[test]
    fn build_create_coffee_ingredient_posts_under_coffee() {
        let coffee = Coffee::reference(12);
        let req = client()
            .build_create_coffee_ingredient(&coffee, &Ingredient::new(10, 60))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:19090/coffees/12/ingredients");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"ID": 10, "Quantity": 60}));
    }

    #[test]
    fn build_create_order_serializes_items() {
        let items = vec![OrderItem::new(Coffee::reference(1), 2)];
        let req = client().build_create_order(&items).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:19090/orders");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!([{"Coffee": {"ID": 1}, "Quantity": 2}]));
    }

    #[test]
    fn build_update_order_puts_to_order_path() {
        let items = vec![OrderItem::new(Coffee::reference(2), 1)];
        let req = client().build_update_order("7", &items).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:19090/orders/7");
    }

    #[test]
    fn build_delete_order_has_no_body() {
        let req = client().build_delete_order("7");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:19090/orders/7");
        assert!(req.body.is_none());
    }

    #[test]
    fn token_is_sent_as_authorization_header() {
        let client = HashicupsClient::with_config(ClientConfig::new("http://localhost:19090").with_token("t0k"));
        let req = client.build_get_order("1");
        assert_eq!(req.headers, vec![("authorization".to_string(), "t0k".to_string())]);
    }

    #[test]
    fn parse_get_coffees_success() {
        let coffees = client()
            .parse_get_coffees(response(200, r#"[{"ID":1,"Name":"Packer Spiced Latte","Ingredient":[{"ID":1}]}]"#))
            .unwrap();
        assert_eq!(coffees.len(), 1);
        assert_eq!(coffees[0].name, "Packer Spiced Latte");
        assert_eq!(coffees[0].ingredients[0].quantity, 0);
    }

    #[test]
    fn parse_get_order_not_found() {
        let err = client().parse_get_order(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_create_order_wrong_status() {
        let err = client().parse_create_order(response(500, "internal error")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_create_order_bad_json() {
        let err = client().parse_create_order(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_delete_order_confirmation() {
        assert!(client().parse_delete_order(response(200, "Deleted order")).is_ok());
    }

    #[test]
    fn parse_delete_order_other_body_is_verbatim_error() {
        let err = client()
            .parse_delete_order(response(200, "order is being brewed"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote(_)));
        assert_eq!(err.to_string(), "order is being brewed");
    }

    #[test]
    fn parse_delete_order_not_found() {
        let err = client().parse_delete_order(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_sign_in_success() {
        let auth = client()
            .parse_sign_in(response(200, r#"{"UserID":1,"Username":"education","token":"abc"}"#))
            .unwrap();
        assert_eq!(auth.username, "education");
    }
}
