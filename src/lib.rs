// fleetstatus: unified fleet status core plus its HTTP/WebSocket surface

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod health;
pub mod models;
pub mod probe;
pub mod routes;
pub mod version;
pub mod worker;
