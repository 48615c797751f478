//! Photo upload gateway feature.
//!
//! Streams an uploaded image to local staging, forwards it to the configured
//! storage backend and returns the backend's reference to it.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/upload-photo` | Upload the image in the `photo` form field |
//! | DELETE | `/api/delete-photo/{fileId}` | Delete a previously uploaded photo |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::PhotoService;
