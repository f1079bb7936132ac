//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length pairs instead of `Vec`,
//! and tagged enums with explicit discriminants. Conversion and release
//! helpers live here to keep `lib.rs` focused on the `extern "C"` surface.
//!
//! Arrays handed to C are boxed slices, so they are released with the same
//! length they were allocated with.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use hashicups_core::error::ApiError;
use hashicups_core::http::{HttpMethod, HttpRequest, HttpResponse};
use hashicups_core::types::{Coffee, Ingredient, Order};

/// Opaque handle to a `HashicupsClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiHashicupsClient {
    pub(crate) inner: hashicups_core::HashicupsClient,
}

/// Length of a C array holding `len` elements, or `None` when `len` does
/// not fit the `u32` length fields.
pub(crate) fn c_array_len(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Move `items` to the heap as a C array. Empty input yields null. Returns
/// `None`, dropping `items`, when the length does not fit in `u32`.
pub(crate) fn into_raw_array<T>(items: Vec<T>) -> Option<(*mut T, u32)> {
    let len = c_array_len(items.len())?;
    if len == 0 {
        return Some((std::ptr::null_mut(), 0));
    }
    Some((Box::into_raw(items.into_boxed_slice()) as *mut T, len))
}

/// Reclaim an array produced by `into_raw_array`.
///
/// # Safety
/// `ptr` and `len` must come from the same `into_raw_array` call.
pub(crate) unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    if ptr.is_null() {
        return Box::default();
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}

/// Borrow a caller-owned array. Null or zero length yields an empty slice.
///
/// # Safety
/// A non-null `ptr` must point to `len` initialized values that outlive `'a`.
pub(crate) unsafe fn borrow_array<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(ptr, len as usize) }
}

/// Copy a caller-owned C string. Returns `None` for null; invalid UTF-8
/// reads as empty.
///
/// # Safety
/// A non-null `ptr` must point to a NUL-terminated string.
pub(crate) unsafe fn read_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("").to_string())
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// # Safety
/// `ptr` must be null or come from `into_c_string`.
unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `hashicups_build_*` functions, or handed to the transport
/// callback during `hashicups_create_custom_order`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    /// Returns null if the header count does not fit in `u32`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        if c_array_len(req.headers.len()).is_none() {
            return std::ptr::null_mut();
        }
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: into_c_string(k),
                value: into_c_string(v),
            })
            .collect();
        let Some((headers, headers_len)) = into_raw_array(headers) else {
            return std::ptr::null_mut();
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), into_c_string),
        }))
    }

    /// Release a request produced by `from_core`.
    ///
    /// # Safety
    /// `req` must be null or come from `from_core`, and not be used afterwards.
    pub(crate) unsafe fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.path);
            free_c_string(req.body);
            for h in from_raw_array(req.headers, req.headers_len).iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller fills this in after executing a request. The FFI layer copies
/// the body and never frees it.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// # Safety
    /// `body` must be null or a NUL-terminated string.
    pub(crate) unsafe fn to_core(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body: unsafe { read_c_string(self.body) }.unwrap_or_default(),
        }
    }
}

/// Executes one request on behalf of `hashicups_create_custom_order`.
///
/// The callback fills `response`; its `body` must stay valid until the
/// callback returns control to the next request or the call completes.
/// Returning `false` reports a transport failure and aborts the order.
pub type FfiTransportFn =
    extern "C" fn(ctx: *mut c_void, request: *const FfiHttpRequest, response: *mut FfiHttpResponse) -> bool;

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// An ingredient quantity, used both for customization overrides passed in
/// and for recipes returned.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiIngredient {
    pub id: i64,
    pub quantity: i64,
}

impl From<&Ingredient> for FfiIngredient {
    fn from(i: &Ingredient) -> Self {
        Self {
            id: i.id,
            quantity: i.quantity,
        }
    }
}

/// A coffee exposed to C.
#[repr(C)]
pub struct FfiCoffee {
    pub id: i64,
    pub name: *mut c_char,
    pub ingredients: *mut FfiIngredient,
    pub ingredients_len: u32,
}

impl FfiCoffee {
    fn from_core(coffee: Coffee) -> Result<Self, ArrayTooLong> {
        let ingredients_len = coffee.ingredients.len();
        let (ingredients, ingredients_len) =
            into_raw_array(coffee.ingredients.iter().map(FfiIngredient::from).collect())
                .ok_or(ArrayTooLong(ingredients_len))?;
        Ok(Self {
            id: coffee.id,
            name: into_c_string(coffee.name),
            ingredients,
            ingredients_len,
        })
    }

    /// # Safety
    /// Must only be called once, on a value built by `from_core`.
    unsafe fn free_fields(&self) {
        unsafe {
            free_c_string(self.name);
            drop(from_raw_array(self.ingredients, self.ingredients_len));
        }
    }
}

/// A list of coffees exposed to C.
#[repr(C)]
pub struct FfiCoffeeList {
    pub items: *mut FfiCoffee,
    pub len: u32,
}

/// A list of ingredients exposed to C.
#[repr(C)]
pub struct FfiIngredientList {
    pub items: *mut FfiIngredient,
    pub len: u32,
}

/// One order line: a coffee reference and a count. Used for input to
/// `hashicups_build_create_order` and in returned orders.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiOrderItem {
    pub coffee_id: i64,
    pub quantity: i64,
}

/// An order exposed to C.
#[repr(C)]
pub struct FfiOrder {
    pub id: *mut c_char,
    pub items: *mut FfiOrderItem,
    pub len: u32,
}

/// A customization request for `hashicups_create_custom_order`: order
/// `quantity` of a new variant of catalog coffee `coffee_id` named `name`,
/// with `overrides` applied to its recipe.
#[repr(C)]
pub struct FfiCustomItem {
    pub coffee_id: i64,
    pub name: *const c_char,
    pub overrides: *const FfiIngredient,
    pub overrides_len: u32,
    pub quantity: i64,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Panic = 5,
    NullArg = 6,
    Transport = 7,
    Validation = 8,
    Remote = 9,
    CatalogFetch = 10,
    IngredientFetch = 11,
    ArrayTooLong = 12,
}

/// An array too long to describe with a `u32` length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrayTooLong(pub usize);

impl std::fmt::Display for ArrayTooLong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "array of {} elements exceeds the u32 length limit", self.0)
    }
}

/// Tag that tells `hashicups_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    CoffeeList = 1,
    IngredientList = 2,
    Order = 3,
}

/// Result envelope for all parse operations and the custom order call.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_coffee_list(coffees: Vec<Coffee>) -> *mut Self {
        let count = coffees.len();
        if c_array_len(count).is_none() {
            return Self::too_long(ArrayTooLong(count));
        }
        let mut converted = Vec::with_capacity(count);
        for coffee in coffees {
            match FfiCoffee::from_core(coffee) {
                Ok(c) => converted.push(c),
                Err(e) => {
                    for c in &converted {
                        unsafe { c.free_fields() };
                    }
                    return Self::too_long(e);
                }
            }
        }
        let Some((items, len)) = into_raw_array(converted) else {
            return Self::too_long(ArrayTooLong(count));
        };
        let list = Box::new(FfiCoffeeList { items, len });
        Self::ok(FfiDataTag::CoffeeList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_ingredient_list(ingredients: Vec<Ingredient>) -> *mut Self {
        let Some((items, len)) = into_raw_array(ingredients.iter().map(FfiIngredient::from).collect()) else {
            return Self::too_long(ArrayTooLong(ingredients.len()));
        };
        let list = Box::new(FfiIngredientList { items, len });
        Self::ok(FfiDataTag::IngredientList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_order(order: Order) -> *mut Self {
        let items = order
            .items
            .iter()
            .map(|item| FfiOrderItem {
                coffee_id: item.coffee.id,
                quantity: item.quantity,
            })
            .collect();
        let Some((items, len)) = into_raw_array(items) else {
            return Self::too_long(ArrayTooLong(order.items.len()));
        };
        let ffi_order = Box::new(FfiOrder {
            id: into_c_string(order.id),
            items,
            len,
        });
        Self::ok(FfiDataTag::Order, Box::into_raw(ffi_order) as *mut c_void)
    }

    /// Build a success result with no data payload (e.g. delete).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Deserialization(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::Serialization(_) => (FfiErrorCode::Serialization, 0),
            ApiError::Validation(_) => (FfiErrorCode::Validation, 0),
            ApiError::Remote(_) => (FfiErrorCode::Remote, 0),
            ApiError::CatalogFetch(_) => (FfiErrorCode::CatalogFetch, 0),
            ApiError::IngredientFetch { .. } => (FfiErrorCode::IngredientFetch, 0),
        };
        Self::error(error_code, http_status, err.to_string())
    }

    /// Build an error result for a payload whose array does not fit a `u32`
    /// length.
    pub(crate) fn too_long(err: ArrayTooLong) -> *mut Self {
        Self::error(FfiErrorCode::ArrayTooLong, 0, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }

    /// Release a result and whatever its `data` points to.
    ///
    /// # Safety
    /// `result` must be null or come from one of the constructors above, and
    /// not be used afterwards.
    pub(crate) unsafe fn free(result: *mut Self) {
        if result.is_null() {
            return;
        }
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.error_message) };
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::CoffeeList => unsafe {
                let list = Box::from_raw(result.data as *mut FfiCoffeeList);
                for coffee in from_raw_array(list.items, list.len).iter() {
                    coffee.free_fields();
                }
            },
            FfiDataTag::IngredientList => unsafe {
                let list = Box::from_raw(result.data as *mut FfiIngredientList);
                drop(from_raw_array(list.items, list.len));
            },
            FfiDataTag::Order => unsafe {
                let order = Box::from_raw(result.data as *mut FfiOrder);
                free_c_string(order.id);
                drop(from_raw_array(order.items, order.len));
            },
            FfiDataTag::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn c_array_len_rejects_lengths_past_u32() {
        assert_eq!(c_array_len(u32::MAX as usize), Some(u32::MAX));
        assert_eq!(c_array_len(u32::MAX as usize + 1), None);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn into_raw_array_refuses_oversized_input() {
        let mut units: Vec<()> = Vec::new();
        // Zero-sized elements need no initialization.
        unsafe { units.set_len(u32::MAX as usize + 1) };
        assert!(into_raw_array(units).is_none());
    }

    #[test]
    fn into_raw_array_round_trips_length() {
        let (ptr, len) = into_raw_array(vec![FfiOrderItem { coffee_id: 1, quantity: 2 }]).unwrap();
        assert_eq!(len, 1);
        let back = unsafe { from_raw_array(ptr, len) };
        assert_eq!(&*back, &[FfiOrderItem { coffee_id: 1, quantity: 2 }]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_payload_is_an_error_result() {
        let result = FfiResult::too_long(ArrayTooLong(5_000_000_000));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::ArrayTooLong);
        assert!(r.data.is_null());
        let msg = unsafe { read_c_string(r.error_message) }.unwrap();
        assert_eq!(msg, "array of 5000000000 elements exceeds the u32 length limit");
        unsafe { FfiResult::free(result) };
    }
}
