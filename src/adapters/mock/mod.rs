//! Mock adapters for tests.

mod http;

pub use http::{MockHttpClient, RecordedRequest};
