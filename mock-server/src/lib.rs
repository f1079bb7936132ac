use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "Quantity", default)]
    pub quantity: i64,
    #[serde(rename = "Unit", default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Coffee {
    #[serde(rename = "ID", default)]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Price", default)]
    pub price: f64,
    #[serde(rename = "Ingredient", default)]
    pub ingredient: Vec<Ingredient>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "Coffee")]
    pub coffee: Coffee,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Items")]
    pub items: Vec<OrderItem>,
}

#[derive(Deserialize)]
pub struct SignIn {
    pub username: String,
    pub password: String,
}

#[derive(Default)]
pub struct Store {
    pub coffees: Vec<Coffee>,
    pub ingredients: HashMap<i64, Vec<Ingredient>>,
    pub orders: HashMap<String, Order>,
}

pub type Db = Arc<RwLock<Store>>;

fn ingredient(id: i64, name: &str, quantity: i64) -> Ingredient {
    Ingredient {
        id,
        name: name.to_string(),
        quantity,
        unit: "ml".to_string(),
    }
}

/// The catalog every fresh server starts with.
pub fn seed() -> Store {
    let recipes = [
        (1, "Packer Spiced Latte", 350.0, vec![ingredient(1, "Espresso", 40), ingredient(2, "Semi Skimmed Milk", 300)]),
        (2, "Terraspresso", 150.0, vec![ingredient(1, "Espresso", 20)]),
        (3, "Vaulatte", 200.0, vec![ingredient(10, "Espresso", 40), ingredient(11, "Semi Skimmed Milk", 300)]),
    ];
    let mut store = Store::default();
    for (id, name, price, ingredients) in recipes {
        store.coffees.push(Coffee {
            id,
            name: name.to_string(),
            price,
            ingredient: ingredients.clone(),
        });
        store.ingredients.insert(id, ingredients);
    }
    store
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/signin", post(sign_in))
        .route("/coffees", get(list_coffees).post(create_coffee))
        .route(
            "/coffees/{id}/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order).put(update_order).delete(delete_order))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn sign_in(Json(input): Json<SignIn>) -> Result<Json<serde_json::Value>, StatusCode> {
    if input.username.is_empty() || input.password.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(serde_json::json!({
        "UserID": 1,
        "Username": input.username,
        "token": Uuid::new_v4().to_string(),
    })))
}

async fn list_coffees(State(db): State<Db>) -> Json<Vec<Coffee>> {
    Json(db.read().await.coffees.clone())
}

async fn create_coffee(State(db): State<Db>, Json(input): Json<Coffee>) -> Json<Coffee> {
    let mut store = db.write().await;
    let id = store.coffees.iter().map(|c| c.id).max().unwrap_or(0) + 1;
    let coffee = Coffee { id, ..input };
    store.ingredients.insert(id, Vec::new());
    store.coffees.push(coffee.clone());
    info!(id, name = %coffee.name, "coffee created");
    Json(coffee)
}

async fn list_ingredients(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Ingredient>>, StatusCode> {
    let store = db.read().await;
    store.ingredients.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_ingredient(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Ingredient>,
) -> Result<Json<Ingredient>, StatusCode> {
    let mut store = db.write().await;
    let ingredients = store.ingredients.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    ingredients.push(input.clone());
    Ok(Json(input))
}

/// Replace each item's coffee with the catalog entry it references, minus
/// the recipe. Unknown coffees are rejected.
fn expand_items(store: &Store, items: Vec<OrderItem>) -> Result<Vec<OrderItem>, StatusCode> {
    items
        .into_iter()
        .map(|item| {
            let coffee = store
                .coffees
                .iter()
                .find(|c| c.id == item.coffee.id)
                .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
            Ok(OrderItem {
                coffee: Coffee {
                    ingredient: Vec::new(),
                    ..coffee.clone()
                },
                quantity: item.quantity,
            })
        })
        .collect()
}

async fn create_order(
    State(db): State<Db>,
    Json(items): Json<Vec<OrderItem>>,
) -> Result<Json<Order>, StatusCode> {
    let mut store = db.write().await;
    let order = Order {
        id: Uuid::new_v4().to_string(),
        items: expand_items(&store, items)?,
    };
    store.orders.insert(order.id.clone(), order.clone());
    info!(id = %order.id, items = order.items.len(), "order created");
    Ok(Json(order))
}

async fn get_order(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Order>, StatusCode> {
    let store = db.read().await;
    store.orders.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_order(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(items): Json<Vec<OrderItem>>,
) -> Result<Json<Order>, StatusCode> {
    let mut store = db.write().await;
    if !store.orders.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let items = expand_items(&store, items)?;
    let order = Order { id, items };
    store.orders.insert(order.id.clone(), order.clone());
    Ok(Json(order))
}

async fn delete_order(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<&'static str, StatusCode> {
    let mut store = db.write().await;
    store.orders.remove(&id).map(|_| "Deleted order").ok_or(StatusCode::NOT_FOUND)
}
