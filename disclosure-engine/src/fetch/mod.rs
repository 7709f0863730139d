//! HTTP client seam.
//!
//! - [`ReqwestClient`]: real transport
//! - [`MockHttpClient`]: scripted responses with a call log, for tests

pub mod http;
pub mod mock;
pub mod traits;

pub use http::ReqwestClient;
pub use mock::{MockHttpClient, RecordedCall};
pub use traits::{FetchError, HttpClient, HttpResponse};
