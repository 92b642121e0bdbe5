pub mod discovery_source;
pub mod endpoint;
pub mod graphql_client;
pub mod logging;
