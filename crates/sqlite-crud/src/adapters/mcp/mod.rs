mod server;
mod tools;

pub use server::{run, McpServer, SERVER_NAME};
