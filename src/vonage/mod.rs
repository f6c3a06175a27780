pub mod client;
pub mod ncco;
