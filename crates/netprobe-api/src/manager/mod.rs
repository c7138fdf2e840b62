// SD-WAN Manager REST client
//
// Session login, device inventory, logout. Every endpoint answers with a
// JSON object; device lists sit under its `data` field.

pub mod auth;
pub mod client;
pub mod devices;
pub mod models;

pub use client::{ManagerClient, SESSION_COOKIE};
pub use models::{DeviceCollection, DeviceRecord};
