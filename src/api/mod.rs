pub mod call;
pub mod transfer;
