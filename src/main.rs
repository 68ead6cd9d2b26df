use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;

use lsb_crypt::{
    cli::{Cli, Commands},
    handler::{handle_analyse, handle_extract, handle_hide},
};

/// 初始化日志：默认只输出警告，可通过 `RUST_LOG` 调整级别。
fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令（`hide`、`extract` 或 `analyse`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    init_logger();

    // 解析命令行参数
    let cli = Cli::parse();

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Extract(args) => handle_extract(args),
        Commands::Analyse(args) => handle_analyse(args),
    }
}
