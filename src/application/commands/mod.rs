//! 应用层 - 命令
//!
//! 唯一的写路径：合成

mod synthesize_commands;

pub mod handlers;

pub use synthesize_commands::*;
