pub mod credentials;
pub mod graph_auth;
pub mod session;
