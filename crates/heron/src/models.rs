//! The objects passed between the agent, its tools, and the model backend.
//!
//! Backends all speak their own wire dialects; providers convert to and from
//! these internal structs immediately at the boundary, so the loop itself only
//! ever sees one shape of message, tool schema, and tool call.
pub mod message;
pub mod role;
pub mod tool;
