pub mod employee;
pub mod leave_request;
pub mod management;
pub mod role;
pub mod user;

pub use employee::{Employee, NewEmployee};
pub use leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, inclusive_days};
pub use management::{ManagementLink, NewManagementLink};
pub use role::Role;
pub use user::Credentials;
