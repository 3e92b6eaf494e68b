pub mod attendance_calc;
pub mod clock;
pub mod db_utils;
pub mod export;
pub mod geo;
pub mod holidays;
pub mod leave_ledger;
pub mod workflow;
