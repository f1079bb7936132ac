//! A client paired with a transport, and the custom order flow built on it.
//!
//! # Design
//! `Session` runs whole operations: build the request, hand it to the
//! transport, parse the response. The custom order flow composes three of
//! those operations in sequence (catalog reads, resource writes, order
//! submission) with no concurrency and no retries. Remote writes cannot be
//! rolled back, so when the flow aborts after writing anything it emits a
//! `warn!` event listing the resources left behind.

use tracing::{debug, info, warn};

use crate::client::HashicupsClient;
use crate::error::{ApiError, ValidationError};
use crate::http::HttpTransport;
use crate::types::{AuthResponse, Coffee, Ingredient, Order, OrderItem, SignInRequest};

/// Executes HashiCups operations through an `HttpTransport`.
pub struct Session<T> {
    client: HashicupsClient,
    transport: T,
}

impl<T: HttpTransport> Session<T> {
    pub fn new(client: HashicupsClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &HashicupsClient {
        &self.client
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn get_coffees(&mut self) -> Result<Vec<Coffee>, ApiError> {
        let response = self.transport.execute(self.client.build_get_coffees())?;
        self.client.parse_get_coffees(response)
    }

    pub fn get_coffee_ingredients(&mut self, coffee_id: i64) -> Result<Vec<Ingredient>, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_get_coffee_ingredients(coffee_id))?;
        self.client.parse_get_coffee_ingredients(response)
    }

    pub fn create_coffee(&mut self, coffee: &Coffee) -> Result<Coffee, ApiError> {
        let response = self.transport.execute(self.client.build_create_coffee(coffee)?)?;
        self.client.parse_create_coffee(response)
    }

    pub fn create_coffee_ingredient(
        &mut self,
        coffee: &Coffee,
        ingredient: &Ingredient,
    ) -> Result<Ingredient, ApiError> {
        let request = self.client.build_create_coffee_ingredient(coffee, ingredient)?;
        let response = self.transport.execute(request)?;
        self.client.parse_create_coffee_ingredient(response)
    }

    pub fn get_order(&mut self, order_id: &str) -> Result<Order, ApiError> {
        let response = self.transport.execute(self.client.build_get_order(order_id))?;
        self.client.parse_get_order(response)
    }

    pub fn create_order(&mut self, items: &[OrderItem]) -> Result<Order, ApiError> {
        let response = self.transport.execute(self.client.build_create_order(items)?)?;
        self.client.parse_create_order(response)
    }

    pub fn update_order(&mut self, order_id: &str, items: &[OrderItem]) -> Result<Order, ApiError> {
        let request = self.client.build_update_order(order_id, items)?;
        let response = self.transport.execute(request)?;
        self.client.parse_update_order(response)
    }

    pub fn delete_order(&mut self, order_id: &str) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_order(order_id))?;
        self.client.parse_delete_order(response)
    }

    pub fn sign_in(&mut self, credentials: &SignInRequest) -> Result<AuthResponse, ApiError> {
        let response = self.transport.execute(self.client.build_sign_in(credentials)?)?;
        self.client.parse_sign_in(response)
    }

    /// Order coffees with customized ingredient quantities.
    ///
    /// Each item's coffee names an existing catalog coffee by `id` and carries
    /// the new variant's `name` plus quantity overrides in `ingredients`. For
    /// every item a new coffee is created with the canonical ingredients,
    /// overridden where requested, and the submitted order references that new
    /// coffee. Items are handled one at a time in input order and the first
    /// failure aborts the call; an item is checked before anything is written
    /// for it.
    pub fn create_custom_order(&mut self, items: &[OrderItem]) -> Result<Order, ApiError> {
        let catalog = self
            .get_coffees()
            .map_err(|e| ApiError::CatalogFetch(Box::new(e)))?;

        let mut created = CreatedResources::default();
        let result = self
            .write_variants(&catalog, items, &mut created)
            .and_then(|order_items| self.create_order(&order_items));
        if let Err(e) = &result {
            created.report(e);
        }
        result
    }

    fn write_variants(
        &mut self,
        catalog: &[Coffee],
        items: &[OrderItem],
        created: &mut CreatedResources,
    ) -> Result<Vec<OrderItem>, ApiError> {
        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            let coffee_id = item.coffee.id;
            let ingredients = self
                .get_coffee_ingredients(coffee_id)
                .map_err(|source| ApiError::IngredientFetch {
                    coffee_id,
                    source: Box::new(source),
                })?;
            let original = catalog
                .iter()
                .find(|c| c.id == coffee_id)
                .ok_or_else(|| ApiError::IngredientFetch {
                    coffee_id,
                    source: Box::new(ApiError::NotFound),
                })?;
            validate_customization(original, &item.coffee)?;

            let variant = Coffee {
                name: item.coffee.name.clone(),
                ..original.clone()
            };
            let variant = Coffee {
                id: self.create_coffee(&variant)?.id,
                ..variant
            };
            info!(original = original.id, variant = variant.id, name = %variant.name, "created coffee variant");
            created.coffees.push(variant.id);

            for ingredient in reconcile_ingredients(&ingredients, &item.coffee.ingredients) {
                self.create_coffee_ingredient(&variant, &ingredient)?;
                created.ingredients.push((variant.id, ingredient.id));
            }

            order_items.push(OrderItem::new(Coffee::reference(variant.id), item.quantity));
        }
        Ok(order_items)
    }
}

/// Check a customization request against the catalog coffee it derives from.
fn validate_customization(original: &Coffee, requested: &Coffee) -> Result<(), ValidationError> {
    if requested.name.is_empty() {
        return Err(ValidationError::MissingName {
            coffee_id: requested.id,
        });
    }
    if original.name == requested.name {
        return Err(ValidationError::SameName {
            name: requested.name.clone(),
        });
    }
    Ok(())
}

/// Canonical ingredients with override quantities applied by ingredient ID.
///
/// Only canonical IDs appear in the result; overrides naming any other
/// ingredient are dropped.
pub fn reconcile_ingredients(canonical: &[Ingredient], overrides: &[Ingredient]) -> Vec<Ingredient> {
    for unmatched in overrides.iter().filter(|o| !canonical.iter().any(|c| c.id == o.id)) {
        debug!(ingredient = unmatched.id, "ignoring override for ingredient outside the recipe");
    }
    canonical
        .iter()
        .map(|ingredient| match overrides.iter().find(|o| o.id == ingredient.id) {
            Some(custom) => Ingredient {
                quantity: custom.quantity,
                ..ingredient.clone()
            },
            None => ingredient.clone(),
        })
        .collect()
}

/// Remote resources written so far by one custom order.
#[derive(Debug, Default)]
struct CreatedResources {
    coffees: Vec<i64>,
    /// `(coffee id, ingredient id)` associations.
    ingredients: Vec<(i64, i64)>,
}

impl CreatedResources {
    fn report(&self, error: &ApiError) {
        if self.coffees.is_empty() {
            return;
        }
        warn!(
            coffees = ?self.coffees,
            ingredients = ?self.ingredients,
            %error,
            "custom order aborted; created resources were not rolled back"
        );
    }
}
