//! Request extractors.

pub mod request_context;

pub use request_context::{attach_request_context, CorrelationId, RequestContext, REQUEST_ID_HEADER};
