//! C-ABI wrapper around `hashicups-core`.
//!
//! # Overview
//! Exposes the HashiCups client through `extern "C"` functions so any
//! language with a C FFI can build and parse HTTP requests/responses without
//! linking to serde directly, and can run a custom order by supplying a
//! transport callback.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - `hashicups_create_custom_order` runs the core `Session` over a C
//!   function pointer; each request is handed to it as an `FfiHttpRequest`
//!   and released as soon as the callback returns.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `hashicups_free_*` function to release them.

pub mod types;

use std::ffi::c_void;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use hashicups_core::error::ApiError;
use hashicups_core::http::{HttpRequest, HttpResponse, HttpTransport};
use hashicups_core::types::{Coffee, Ingredient, OrderItem};
use hashicups_core::{ClientConfig, HashicupsClient, Session};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`. `token` may be null; otherwise it
/// is sent as the `Authorization` header on every request.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `hashicups_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_client_new(base_url: *const c_char, token: *const c_char) -> *mut FfiHashicupsClient {
    catch_unwind(|| {
        let Some(url) = (unsafe { read_c_string(base_url) }) else {
            return std::ptr::null_mut();
        };
        let mut config = ClientConfig::new(&url);
        if let Some(token) = unsafe { read_c_string(token) } {
            config = config.with_token(token);
        }
        let client = HashicupsClient::with_config(config);
        Box::into_raw(Box::new(FfiHashicupsClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `hashicups_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_client_free(client: *mut FfiHashicupsClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build an HTTP request for the coffee catalog.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `hashicups_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_build_get_coffees(client: *const FfiHashicupsClient) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_get_coffees())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for the canonical ingredients of `coffee_id`.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_build_get_coffee_ingredients(
    client: *const FfiHashicupsClient,
    coffee_id: i64,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_get_coffee_ingredients(coffee_id))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for fetching a single order.
///
/// Returns null if `client` or `order_id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_build_get_order(
    client: *const FfiHashicupsClient,
    order_id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(id) = (unsafe { read_c_string(order_id) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_get_order(&id))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request that orders existing coffees.
///
/// `items` may be null only when `len` is 0.
/// Returns null if `client` is null or if serialization fails.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_build_create_order(
    client: *const FfiHashicupsClient,
    items: *const FfiOrderItem,
    len: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || (items.is_null() && len > 0) {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let items: Vec<OrderItem> = unsafe { borrow_array(items, len) }
            .iter()
            .map(|item| OrderItem::new(Coffee::reference(item.coffee_id), item.quantity))
            .collect();
        match client.inner.build_create_order(&items) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for deleting an order.
///
/// Returns null if `client` or `order_id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_build_delete_order(
    client: *const FfiHashicupsClient,
    order_id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(id) = (unsafe { read_c_string(order_id) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_delete_order(&id))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Shared null checks and conversion for every `hashicups_parse_*` function.
fn parse_with(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&HashicupsClient, HttpResponse) -> *mut FfiResult,
) -> *mut FfiResult {
    if client.is_null() {
        return FfiResult::null_arg("client");
    }
    if response.is_null() {
        return FfiResult::null_arg("response");
    }
    let client = unsafe { &*client };
    let core_resp = unsafe { (*response).to_core() };
    parse(&client.inner, core_resp)
}

/// Parse the response to a catalog request.
///
/// Returns a result with `data_tag = CoffeeList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_parse_get_coffees(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, resp| match c.parse_get_coffees(resp) {
            Ok(coffees) => FfiResult::ok_coffee_list(coffees),
            Err(e) => FfiResult::from_error(e),
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_parse_get_coffees"))
}

/// Parse the response to a coffee ingredients request.
///
/// Returns a result with `data_tag = IngredientList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_parse_get_coffee_ingredients(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, resp| match c.parse_get_coffee_ingredients(resp) {
            Ok(ingredients) => FfiResult::ok_ingredient_list(ingredients),
            Err(e) => FfiResult::from_error(e),
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_parse_get_coffee_ingredients"))
}

/// Parse the response to a get-order request.
///
/// Returns a result with `data_tag = Order` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_parse_get_order(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, resp| match c.parse_get_order(resp) {
            Ok(order) => FfiResult::ok_order(order),
            Err(e) => FfiResult::from_error(e),
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_parse_get_order"))
}

/// Parse the response to a create-order request.
///
/// Returns a result with `data_tag = Order` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_parse_create_order(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, resp| match c.parse_create_order(resp) {
            Ok(order) => FfiResult::ok_order(order),
            Err(e) => FfiResult::from_error(e),
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_parse_create_order"))
}

/// Parse the response to a delete-order request.
///
/// Returns a result with `data_tag = None` on success. Any body other than
/// the confirmation text yields `error_code = Remote` with the body as
/// `error_message`.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_parse_delete_order(
    client: *const FfiHashicupsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, resp| match c.parse_delete_order(resp) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_error(e),
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_parse_delete_order"))
}

// ---------------------------------------------------------------------------
// Custom order
// ---------------------------------------------------------------------------

/// Adapts a C callback to the core `HttpTransport` trait.
struct CallbackTransport {
    callback: FfiTransportFn,
    ctx: *mut c_void,
}

impl HttpTransport for CallbackTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let ffi_req = FfiHttpRequest::from_core(request);
        if ffi_req.is_null() {
            return Err(ApiError::Transport("request too large to pass to the transport callback".to_string()));
        }
        let mut out = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
        };
        let delivered = (self.callback)(self.ctx, ffi_req, &mut out);
        let result = if delivered {
            Ok(unsafe { out.to_core() })
        } else {
            Err(ApiError::Transport("transport callback reported failure".to_string()))
        };
        unsafe { FfiHttpRequest::free(ffi_req) };
        result
    }
}

/// Place a custom order, executing every request through `transport`.
///
/// Requests are issued one at a time, in item order: the catalog, then per
/// item its recipe, the new coffee and its ingredients, and finally the
/// order. Returns a result with `data_tag = Order` on success. On failure
/// nothing already created is rolled back.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_create_custom_order(
    client: *const FfiHashicupsClient,
    items: *const FfiCustomItem,
    len: u32,
    transport: Option<FfiTransportFn>,
    ctx: *mut c_void,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if items.is_null() && len > 0 {
            return FfiResult::null_arg("items");
        }
        let Some(callback) = transport else {
            return FfiResult::null_arg("transport");
        };
        let client = unsafe { &*client };

        let mut order_items = Vec::with_capacity(len as usize);
        for item in unsafe { borrow_array(items, len) } {
            if item.overrides.is_null() && item.overrides_len > 0 {
                return FfiResult::null_arg("overrides");
            }
            let overrides = unsafe { borrow_array(item.overrides, item.overrides_len) }
                .iter()
                .map(|o| Ingredient::new(o.id, o.quantity))
                .collect();
            let name = unsafe { read_c_string(item.name) }.unwrap_or_default();
            order_items.push(OrderItem::new(
                Coffee::customized(item.coffee_id, name, overrides),
                item.quantity,
            ));
        }

        let mut session = Session::new(client.inner.clone(), CallbackTransport { callback, ctx });
        match session.create_custom_order(&order_items) {
            Ok(order) => FfiResult::ok_order(order),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hashicups_create_custom_order"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `hashicups_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiResult` returned by any `hashicups_parse_*` function or by
/// `hashicups_create_custom_order`. Safe to call with null. Uses `data_tag`
/// to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn hashicups_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiResult::free(result) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
