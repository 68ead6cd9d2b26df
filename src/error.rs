//! # 错误类型模块
//!
//! 定义核心隐写流程 (加密、编解码、嵌入、提取) 的全部失败情形。
//! 命令处理层使用 `anyhow` 为这些错误附加上下文。

use thiserror::Error;

/// 隐写核心操作可能返回的错误。
#[derive(Error, Debug)]
pub enum StegoError {
    /// 载荷所需的 bit 数超出图像容量 (含 4 KB 安全余量)。
    #[error("payload needs {required_bits} bits but the image only offers {available_bits} usable bits")]
    CapacityExceeded {
        required_bits: u64,
        available_bits: u64,
    },

    /// AEAD 标签校验失败：密码错误或数据已损坏。
    #[error("authentication failed: wrong password or corrupted data")]
    Authentication,

    /// 长度前缀或比特流格式错误，通常意味着输入不是隐写图像。
    #[error("malformed payload: {0}")]
    Format(String),

    /// 输出路径不是无损图像格式。
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// 载荷或输出文件读写失败。
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// 图像解码或编码失败。
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
