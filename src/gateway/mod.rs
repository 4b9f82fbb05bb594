// src/gateway/mod.rs
mod command;
mod permission;

pub use command::{CommandGateway, GatewayReply, Notice, DENIAL_MESSAGE};
pub use permission::{is_admin_or_privileged, Identity};
