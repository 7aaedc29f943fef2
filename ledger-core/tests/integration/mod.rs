mod audit_channel;
mod config_loading;
mod distribution;
mod fungible_tokens;
mod network_queries;
