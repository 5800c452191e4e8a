pub mod journal;
pub mod symbols;
pub mod trade;
