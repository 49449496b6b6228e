pub mod admin;
pub mod leave_request;
