//! Request and response models.
//!
//! These are the values that cross the worker's boundaries:
//!
//! - `Request`: an outbound request observed by the fetch interceptor
//! - `RequestKey`: the identity a request is stored under in a partition
//! - `Response`: a network reply or a stored cache entry

pub mod request;
pub mod response;

pub use request::{Request, RequestKey};
pub use response::Response;
