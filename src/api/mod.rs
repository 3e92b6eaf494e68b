pub mod attendance;
pub mod attendance_admin;
pub mod compensatory_leave;
pub mod employee;
pub mod expense_claim;
pub mod leave_request;
pub mod notification;
pub mod project;
pub mod reports;
pub mod shift;
pub mod travel_request;
pub mod wfh;
pub mod workflow_docs;
