pub mod attendance;
pub mod department;
pub mod employee;
pub mod holiday;
pub mod leave_request;
pub mod notification;
pub mod office;
pub mod project;
pub mod role;
pub mod shift;
pub mod wfh_request;
pub mod workflow;
