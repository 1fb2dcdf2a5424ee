pub mod serve;
pub mod start;
