pub mod answer;
pub mod event;
pub mod host;
pub mod query;
pub mod signature;
