//! Integration tests for the Medlr API
//!
//! Each test drives the real router over in-memory backends, covering
//! credential checks, cache-aside pharmacy reads and the CRUD endpoints.

mod health;
mod medicines;
mod users;
