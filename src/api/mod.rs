//! View models handed to the templates.

pub mod request;
pub mod user;

pub use self::{request::ServiceRequest, user::User};
