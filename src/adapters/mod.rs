//! Transport adapters: the production reqwest client and test mocks.

pub mod mock;
mod reqwest_http;

pub use mock::MockHttpClient;
pub use reqwest_http::ReqwestHttpClient;
