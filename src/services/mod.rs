pub mod ai;
pub mod personalities;
