//! 프로듀서 -- 로그 스트림을 출력하는 외부 프로세스
//!
//! [`Producer`] trait은 "실행하면 읽을 수 있는 바이트 스트림이 나온다"는 계약만 정의합니다.
//! 실제 구현은 [`CommandProducer`]이며, 테스트에서는 메모리 기반 구현으로 대체합니다.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::StreamError;

/// 로그 스트림 프로듀서
pub trait Producer: Send {
    /// 프로듀서 출력 스트림 타입
    type Output: AsyncRead + Unpin + Send;

    /// 프로듀서를 한 번 실행합니다.
    fn launch(&mut self) -> Result<ProducerRun<Self::Output>, StreamError>;
}

/// 실행 중인 프로듀서 하나
///
/// 출력 스트림과 (있다면) 자식 프로세스 핸들을 함께 소유합니다.
/// [`ProducerRun::terminate`]를 호출하지 않고 버려도 자식 프로세스는 종료됩니다.
#[derive(Debug)]
pub struct ProducerRun<R> {
    output: R,
    child: Option<Child>,
    pid: Option<u32>,
}

impl<R> ProducerRun<R> {
    /// 자식 프로세스와 그 출력으로 생성합니다.
    pub fn from_child(child: Child, output: R) -> Self {
        let pid = child.id();
        Self {
            output,
            child: Some(child),
            pid,
        }
    }

    /// 프로세스 없이 출력 스트림만으로 생성합니다.
    pub fn detached(output: R) -> Self {
        Self {
            output,
            child: None,
            pid: None,
        }
    }

    /// 자식 프로세스 PID
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// 출력 스트림
    pub fn output_mut(&mut self) -> &mut R {
        &mut self.output
    }

    /// 프로세스를 강제 종료하고 회수합니다.
    ///
    /// 이미 종료된 프로세스면 조용히 넘어갑니다.
    pub async fn terminate(mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.start_kill() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::InvalidInput => {
                debug!(pid = ?self.pid, "producer already exited");
            }
            Err(e) => {
                warn!(pid = ?self.pid, error = %e, "failed to kill producer");
            }
        }

        match child.wait().await {
            Ok(status) => debug!(pid = ?self.pid, %status, "producer reaped"),
            Err(e) => warn!(pid = ?self.pid, error = %e, "failed to reap producer"),
        }
    }
}

/// 외부 명령을 실행하는 프로듀서
///
/// 표준 출력만 파이프로 연결하고, 표준 입력/에러는 버립니다.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    command: String,
    args: Vec<String>,
}

impl CommandProducer {
    /// 새 명령 프로듀서를 생성합니다.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// 스트림 설정의 명령과 인자로 생성합니다.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    /// 실행할 명령
    pub fn command(&self) -> &str {
        &self.command
    }

    /// 명령 인자
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn launch_error(&self, reason: impl ToString) -> StreamError {
        StreamError::Launch {
            command: self.command.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Producer for CommandProducer {
    type Output = ChildStdout;

    fn launch(&mut self) -> Result<ProducerRun<ChildStdout>, StreamError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.launch_error("stdout pipe unavailable"))?;

        Ok(ProducerRun::from_child(child, stdout))
    }
}
