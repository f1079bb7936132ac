//! Synchronous API client core for the HashiCups coffee service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A caller-supplied
//! `HttpTransport` executes the actual round trip; `Session` combines the two
//! and hosts the custom order flow, which turns customization requests into
//! new coffee variants before ordering them.
//!
//! # Design
//! - `HashicupsClient` is stateless: it holds only its `ClientConfig`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod types;

pub use client::{HashicupsClient, DELETED_ORDER_CONFIRMATION};
pub use config::ClientConfig;
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use session::{reconcile_ingredients, Session};
pub use types::{AuthResponse, Coffee, Ingredient, Order, OrderItem, SignInRequest};
