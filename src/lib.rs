pub mod coach;
pub mod config;
pub mod langflow;
pub mod prompts;
pub mod render;
pub mod server;
