//! Domain DTOs for the HashiCups API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates.
//!
//! Wire keys are case-sensitive (`ID`, `Name`, `Ingredient`, ...), so every
//! field carries an explicit rename. Fields the client does not model (price,
//! teaser, ingredient units, order metadata) are kept in an `extra` map so a
//! value read from the server can be written back without losing anything.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server fields the client passes through without interpreting.
pub type ExtraFields = Map<String, Value>;

/// A coffee, either a catalog entry or a customization request on an order
/// line. The same wire shape serves both roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Coffee {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(
        rename = "Ingredient",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ingredients: Vec<Ingredient>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Coffee {
    /// A bare reference to an existing coffee, as sent on finalized order items.
    pub fn reference(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// A customization request: a new name plus ingredient quantity overrides
    /// for the catalog coffee `id`.
    pub fn customized(id: i64, name: impl Into<String>, overrides: Vec<Ingredient>) -> Self {
        Self {
            id,
            name: name.into(),
            ingredients: overrides,
            extra: ExtraFields::new(),
        }
    }
}

/// An ingredient quantity attached to a coffee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Quantity", default)]
    pub quantity: i64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Ingredient {
    pub fn new(id: i64, quantity: i64) -> Self {
        Self {
            id,
            quantity,
            extra: ExtraFields::new(),
        }
    }
}

/// One line of an order: a coffee and how many of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(rename = "Coffee")]
    pub coffee: Coffee,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

impl OrderItem {
    pub fn new(coffee: Coffee, quantity: i64) -> Self {
        Self { coffee, quantity }
    }
}

/// An order as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Items", default, deserialize_with = "null_as_empty")]
    pub items: Vec<OrderItem>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Credentials for `POST /signin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Token issued by `POST /signin`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Username")]
    pub username: String,
    pub token: String,
}

/// The server sends `null` rather than `[]` for empty lists.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coffee_reference_serializes_id_only() {
        let item = OrderItem::new(Coffee::reference(7), 2);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({"Coffee": {"ID": 7}, "Quantity": 2}));
    }

    #[test]
    fn coffee_keeps_unmodelled_fields() {
        let raw = r#"{"ID":3,"Name":"Vaulatte","Price":200,"Teaser":"Nothing gives you a safe and secure feeling like a Vaulatte","Ingredient":[{"ID":10,"Quantity":40,"Unit":"ml"}]}"#;
        let coffee: Coffee = serde_json::from_str(raw).unwrap();
        assert_eq!(coffee.name, "Vaulatte");
        assert_eq!(coffee.extra["Price"], 200);
        assert_eq!(coffee.ingredients[0].extra["Unit"], "ml");

        let back = serde_json::to_value(&coffee).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn null_ingredient_list_is_empty() {
        let coffee: Coffee = serde_json::from_str(r#"{"ID":1,"Name":"A","Ingredient":null}"#).unwrap();
        assert!(coffee.ingredients.is_empty());
    }

    #[test]
    fn order_without_items_parses() {
        let order: Order = serde_json::from_str(r#"{"ID":"42","Items":null}"#).unwrap();
        assert_eq!(order.id, "42");
        assert!(order.items.is_empty());
    }

    #[test]
    fn auth_response_uses_server_keys() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"UserID":1,"Username":"education","token":"abc"}"#).unwrap();
        assert_eq!(auth.user_id, 1);
        assert_eq!(auth.token, "abc");
    }
}
