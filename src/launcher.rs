//! Launcher - 环境激活 + 工作室进程启动
//!
//! 两段式启动序列：先探测运行时环境（conda 环境）是否可激活，
//! 再以该环境启动工作室进程并等待其退出。
//! 每一步失败都打印固定诊断信息，等待操作员确认后以非零状态退出。
//! 严格顺序执行，无重试，无超时。

use std::io::{BufRead, Write};
use std::process::Command;
use thiserror::Error;

use crate::config::LauncherConfig;

/// 启动错误
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Environment activation failed (exit code {code})")]
    ActivationFailed { code: i32 },

    #[error("Studio process exited with code {code}")]
    StudioFailed { code: i32 },

    #[error("Failed to run {program}: {source}")]
    SpawnError {
        program: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 子进程执行抽象
///
/// 返回退出码；spawn 失败返回错误
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<i32, LaunchError>;
}

/// 操作员确认抽象（阻塞直到确认）
pub trait AckSource {
    fn wait_for_ack(&mut self) -> Result<(), LaunchError>;
}

/// 通过 std::process::Command 同步执行并继承 stdio
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<i32, LaunchError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| LaunchError::SpawnError {
                program: program.to_string(),
                source,
            })?;

        // 被信号终止时没有退出码，按失败处理
        Ok(status.code().unwrap_or(1))
    }
}

/// 从 stdin 读一行作为操作员确认
pub struct StdinAck;

impl AckSource for StdinAck {
    fn wait_for_ack(&mut self) -> Result<(), LaunchError> {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

/// 激活失败诊断信息
pub fn activation_failure_message(env_name: &str, env_manager: &str) -> String {
    format!(
        "Failed to activate the '{env}' environment.\n\
         Make sure {manager} is installed and the environment has been created:\n\
         \x20\x20{manager} create -n {env} python=3.11",
        env = env_name,
        manager = env_manager,
    )
}

/// 工作室进程失败诊断信息
pub fn studio_failure_message(env_name: &str) -> String {
    format!(
        "MuLa Studio exited with an error.\n\
         Please verify that all dependencies are installed in the '{}' environment.",
        env_name,
    )
}

/// 两段式启动器
pub struct Launcher<R, A, W> {
    config: LauncherConfig,
    runner: R,
    ack: A,
    /// 诊断信息输出目标
    out: W,
}

impl<R: CommandRunner, A: AckSource, W: Write> Launcher<R, A, W> {
    pub fn new(config: LauncherConfig, runner: R, ack: A, out: W) -> Self {
        Self {
            config,
            runner,
            ack,
            out,
        }
    }

    /// 执行启动序列
    ///
    /// 成功时不打印任何诊断信息并返回 Ok；
    /// 任一检查点失败时打印诊断、等待确认并返回对应错误。
    pub fn run(&mut self) -> Result<(), LaunchError> {
        self.activate_environment()?;
        self.start_studio()
    }

    /// 检查点 1：环境激活探测
    ///
    /// `{manager} run -n {env} python --version` 非零即视为激活失败；
    /// 管理器本身不存在（spawn 失败）同样算激活失败。
    fn activate_environment(&mut self) -> Result<(), LaunchError> {
        let args = vec![
            "run".to_string(),
            "-n".to_string(),
            self.config.env_name.clone(),
            "python".to_string(),
            "--version".to_string(),
        ];

        tracing::info!(
            env_name = %self.config.env_name,
            env_manager = %self.config.env_manager,
            "Activating runtime environment"
        );

        let code = match self.runner.run(&self.config.env_manager, &args) {
            Ok(0) => return Ok(()),
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Environment manager unavailable");
                self.fail_checkpoint(&activation_failure_message(
                    &self.config.env_name,
                    &self.config.env_manager,
                ))?;
                return Err(e);
            }
        };

        tracing::error!(code = code, "Environment activation failed");
        self.fail_checkpoint(&activation_failure_message(
            &self.config.env_name,
            &self.config.env_manager,
        ))?;
        Err(LaunchError::ActivationFailed { code })
    }

    /// 检查点 2：启动工作室进程并等待退出
    fn start_studio(&mut self) -> Result<(), LaunchError> {
        let args = vec![
            "run".to_string(),
            "-n".to_string(),
            self.config.env_name.clone(),
            self.config.studio_command.clone(),
        ];

        tracing::info!(
            command = %self.config.studio_command,
            "Starting studio process"
        );

        let code = match self.runner.run(&self.config.env_manager, &args) {
            Ok(0) => return Ok(()),
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start studio process");
                self.fail_checkpoint(&studio_failure_message(&self.config.env_name))?;
                return Err(e);
            }
        };

        tracing::error!(code = code, "Studio process failed");
        self.fail_checkpoint(&studio_failure_message(&self.config.env_name))?;
        Err(LaunchError::StudioFailed { code })
    }

    /// 打印诊断信息并阻塞等待操作员确认
    fn fail_checkpoint(&mut self, message: &str) -> Result<(), LaunchError> {
        writeln!(self.out, "{}", message)?;
        writeln!(self.out, "Press Enter to exit...")?;
        self.out.flush()?;
        self.ack.wait_for_ack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 按调用顺序返回预设退出码
    struct ScriptedRunner {
        results: Vec<Result<i32, LaunchError>>,
        calls: Vec<(String, Vec<String>)>,
    }

    impl ScriptedRunner {
        fn new(results: Vec<Result<i32, LaunchError>>) -> Self {
            Self {
                results,
                calls: Vec::new(),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&mut self, program: &str, args: &[String]) -> Result<i32, LaunchError> {
            self.calls.push((program.to_string(), args.to_vec()));
            self.results.remove(0)
        }
    }

    struct CountingAck {
        acks: usize,
    }

    impl AckSource for CountingAck {
        fn wait_for_ack(&mut self) -> Result<(), LaunchError> {
            self.acks += 1;
            Ok(())
        }
    }

    fn test_config() -> LauncherConfig {
        LauncherConfig {
            env_name: "heartlib".to_string(),
            env_manager: "conda".to_string(),
            studio_command: "mula-studio".to_string(),
        }
    }

    #[test]
    fn activation_failure_halts_before_studio() {
        let runner = ScriptedRunner::new(vec![Ok(1)]);
        let ack = CountingAck { acks: 0 };
        let mut out = Vec::new();
        let mut launcher = Launcher::new(test_config(), runner, ack, &mut out);

        let result = launcher.run();
        assert!(matches!(result, Err(LaunchError::ActivationFailed { code: 1 })));

        // 只有激活探测被执行，工作室进程从未启动
        assert_eq!(launcher.runner.calls.len(), 1);
        assert_eq!(launcher.ack.acks, 1);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Failed to activate the 'heartlib' environment"));
        assert!(!printed.contains("MuLa Studio exited"));
    }

    #[test]
    fn missing_env_manager_counts_as_activation_failure() {
        let spawn_err = LaunchError::SpawnError {
            program: "conda".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let runner = ScriptedRunner::new(vec![Err(spawn_err)]);
        let ack = CountingAck { acks: 0 };
        let mut out = Vec::new();
        let mut launcher = Launcher::new(test_config(), runner, ack, &mut out);

        let result = launcher.run();
        assert!(result.is_err());
        assert_eq!(launcher.runner.calls.len(), 1);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Failed to activate the 'heartlib' environment"));
    }

    #[test]
    fn studio_failure_prints_dependency_guidance() {
        let runner = ScriptedRunner::new(vec![Ok(0), Ok(2)]);
        let ack = CountingAck { acks: 0 };
        let mut out = Vec::new();
        let mut launcher = Launcher::new(test_config(), runner, ack, &mut out);

        let result = launcher.run();
        assert!(matches!(result, Err(LaunchError::StudioFailed { code: 2 })));
        assert_eq!(launcher.runner.calls.len(), 2);
        assert_eq!(launcher.ack.acks, 1);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("verify that all dependencies are installed"));
        assert!(!printed.contains("Failed to activate"));
    }

    #[test]
    fn success_is_silent_and_exits_zero() {
        let runner = ScriptedRunner::new(vec![Ok(0), Ok(0)]);
        let ack = CountingAck { acks: 0 };
        let mut out = Vec::new();
        let mut launcher = Launcher::new(test_config(), runner, ack, &mut out);

        let result = launcher.run();
        assert!(result.is_ok());
        assert_eq!(launcher.runner.calls.len(), 2);
        assert_eq!(launcher.ack.acks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn studio_runs_inside_named_environment() {
        let runner = ScriptedRunner::new(vec![Ok(0), Ok(0)]);
        let ack = CountingAck { acks: 0 };
        let mut out = Vec::new();
        let mut launcher = Launcher::new(test_config(), runner, ack, &mut out);

        launcher.run().unwrap();

        let (program, args) = &launcher.runner.calls[1];
        assert_eq!(program, "conda");
        assert_eq!(args, &["run", "-n", "heartlib", "mula-studio"]);
    }
}
