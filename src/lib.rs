pub mod core;
pub mod tools;

// Hooks for intercepting tool calls
pub mod hooks;

// Keeps secret variables out of spawned shells
pub mod sanitize;

// Tool execution behind the hook pipeline
pub mod agent;

pub mod logging;
