//! Request handlers, one module per resource.

pub mod blogs;
pub mod donation_requests;
pub mod fundings;
pub mod session;
pub mod users;
