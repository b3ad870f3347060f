pub mod individual;
pub mod totals;
