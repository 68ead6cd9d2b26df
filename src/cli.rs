//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::constants::{DEFAULT_BLOCK_SIZE, DEFAULT_KDF_ITERATIONS};
use clap::Parser;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，将加密后的文件隐藏在无损格式图像 (如 PNG, BMP) 中。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，将经 AES-256-GCM 加密的文件隐藏在无损格式图像 (如 PNG, BMP) 中，并提供 LSB 统计分析以检测此类隐写。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、extract (提取) 和 analyse (分析)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 加密文件并隐藏在无损格式图像中。
    Hide(HideArgs),

    /// 从隐写图像中提取并解密隐藏的文件。
    Extract(ExtractArgs),

    /// 对图像的 LSB 做分块统计，用于检测隐写。
    Analyse(AnalyseArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件路径，可以是任意二进制内容。
    #[arg(short, long)]
    pub payload: PathBuf,

    /// 隐写结果图像的输出路径，必须是无损格式。默认为 `<图像名>-stego.<扩展名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 加密密码。
    #[arg(short = 'P', long, env = "LSB_CRYPT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// PBKDF2 迭代次数，提取时必须使用相同的值。
    #[arg(long, default_value_t = DEFAULT_KDF_ITERATIONS)]
    pub kdf_iterations: NonZeroU32,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'extract' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复数据的输出路径。默认为 `<图像名>-recovered.bin`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 解密密码。
    #[arg(short = 'P', long, env = "LSB_CRYPT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// PBKDF2 迭代次数，必须与隐藏时一致。
    #[arg(long, default_value_t = DEFAULT_KDF_ITERATIONS)]
    pub kdf_iterations: NonZeroU32,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'analyse' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct AnalyseArgs {
    /// 待分析的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 每个统计块包含的像素数。
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: NonZeroUsize,

    /// 以 CSV (block,red,green,blue) 输出全部块均值，便于外部绘图。
    #[arg(long)]
    pub csv: bool,
}
