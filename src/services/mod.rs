pub mod api_server;
pub mod identifier_provider;
pub mod resolver;
