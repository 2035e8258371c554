//! Read-only HTTP surface.

mod server;

pub use server::{route, status_response, ApiServer, StatusResponse, Summary};
