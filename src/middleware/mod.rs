pub mod request_context;

pub use request_context::{
    make_request_span, request_context_middleware, CurrentUser, RequestId, REQUEST_ID_HEADER,
    USER_ID_HEADER,
};
