use std::num::{NonZeroU32, NonZeroUsize};

/// PBKDF2 盐值长度 (字节)。
pub const SALT_LEN: usize = 16;

/// AES-256-GCM nonce 长度 (字节)。
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM 认证标签长度 (字节)。
pub const TAG_LEN: usize = 16;

/// 派生密钥长度 (字节)，对应 AES-256。
pub const KEY_LEN: usize = 32;

/// 加密块中除密文以外的固定开销：盐值 + nonce + 标签。
pub const BLOB_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// PBKDF2 默认迭代次数。
/// 隐藏与提取必须使用相同的值，否则密钥不一致，解密将以认证失败告终。
pub const DEFAULT_KDF_ITERATIONS: NonZeroU32 = match NonZeroU32::new(1_000_000) {
    Some(n) => n,
    None => panic!("KDF iteration count must be non-zero"),
};

/// 长度前缀占用的字节数 (大端序 `u32`)。
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// 每个像素可用的 LSB 通道数 (R, G, B)，Alpha 通道从不使用。
pub const CHANNELS_PER_PIXEL: usize = 3;

/// 容量安全余量：4 KB，以 bit 计。
pub const SAFETY_MARGIN_BITS: u64 = 4 * 1024 * 8;

/// LSB 分析默认的块大小 (样本数)。
pub const DEFAULT_BLOCK_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => panic!("block size must be non-zero"),
};

/// 可安全写出隐写图像的无损格式扩展名 (小写)。
pub const LOSSLESS_EXTENSIONS: [&str; 6] = ["png", "bmp", "tif", "tiff", "qoi", "webp"];

/// 当输入扩展名不属于无损格式时，默认输出使用的扩展名。
pub const DEFAULT_OUTPUT_EXTENSION: &str = "png";
