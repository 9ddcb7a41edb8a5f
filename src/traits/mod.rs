//! Trait abstractions over transport, for dependency injection in tests.

mod http;

pub use http::{Headers, HttpClient, HttpError, HttpResponse};
