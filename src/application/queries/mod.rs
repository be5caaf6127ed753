//! 应用层 - 查询
//!
//! 只读操作，不触发模型加载

mod health_queries;

pub mod handlers;

pub use health_queries::*;
