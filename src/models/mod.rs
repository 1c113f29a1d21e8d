//! Core data models for the image gateway.
//!
//! `image` holds the stored record and the search result shape; `requests`
//! holds the JSON bodies accepted and returned by the HTTP handlers.

pub mod image;
pub mod requests;
