//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `PUT /objects` - Store an expiring object
//! - `DELETE /objects` - Drop every expiring object
//! - `GET /objects/:key` - Retrieve an object by key
//! - `DELETE /objects/:key` - Remove an object
//! - `POST /objects/:key/guarantee` - Extend an object's lifetime
//! - `POST /sweep` - Remove expired objects
//! - `GET /text/:text_type/:id` - Read cached text
//! - `PUT /text/:text_type/:id` - Store text from the request body
//! - `GET /text/:text_type/:id/age` - Age of a text entry
//! - `DELETE /text/:text_type` - Clear a text type
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
