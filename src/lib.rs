#![allow(dead_code)]

//! # Market Pulse
//!
//! 加密市场监控看板的多级行情缓存核心：
//! 进程内/Redis/文件桥三级缓存、新鲜度与占位判定、
//! 后台聚合器与带实时回退的读取路径。

pub mod app_config;
pub mod cache;
pub mod error;
pub mod job;
pub mod market;
pub mod time_util;

// 重新导出常用类型
pub use error::AppError;
