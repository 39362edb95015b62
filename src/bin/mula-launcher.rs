//! MuLa Launcher - 环境激活 + 工作室启动入口
//!
//! 双击/命令行启动，无参数。退出码反映两个检查点的结果。

use mula_studio::config::load_config;
use mula_studio::launcher::{Launcher, StdinAck, SystemCommandRunner};

fn main() -> std::process::ExitCode {
    // 日志走 stderr，诊断信息走 stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let mut launcher = Launcher::new(
        config.launcher,
        SystemCommandRunner,
        StdinAck,
        std::io::stdout(),
    );

    match launcher.run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Launch sequence failed");
            std::process::ExitCode::FAILURE
        }
    }
}
