//! # lsb_crypt 库
//!
//! 本库包含加密 LSB 隐写工具的核心逻辑：载荷加密、比特编解码、像素嵌入与提取，以及 LSB 统计分析。

// 声明库包含的所有模块。

pub mod analysis;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod steganography;
