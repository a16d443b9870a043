//! Route Configuration Module
//!
//! - **`router`** - Main router creation, middleware and fallback
//! - **`api_routes`** - The `/api` route table

pub mod api_routes;
pub mod router;

pub use router::create_router;
