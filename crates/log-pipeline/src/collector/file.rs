//! 파일 기반 로그 tailer
//!
//! 로그 파일을 감시하며 새로운 라인이 추가되면 수집합니다.
//! `tail -F`와 유사한 동작을 비동기 폴링으로 구현합니다.
//!
//! # 로테이션 감지
//! - inode 변경 감지 (logrotate 등, Unix 전용): 이전 파일을 끝까지 읽은 뒤 새 파일로 전환
//! - 파일 크기 축소 감지 (truncation): 처음부터 다시 읽기
//! - 로테이션 직후 파일이 잠시 없으면 다음 폴링에서 다시 열기

use std::fs::Metadata;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ngxlog_core::config::TailConfig;

use super::TailEvent;
use crate::error::LogPipelineError;

/// 한 번의 read 호출로 읽을 바이트 수
const READ_CHUNK: usize = 64 * 1024;

/// 파일 tailer 설정
#[derive(Debug, Clone)]
pub struct FileTailerConfig {
    /// 파일 처음부터 읽을지 여부 (false면 끝으로 이동 후 시작)
    pub from_beginning: bool,
    /// 파일 상태 체크 주기
    pub poll_interval: Duration,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for FileTailerConfig {
    fn default() -> Self {
        Self {
            from_beginning: false,
            poll_interval: Duration::from_millis(250),
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

impl FileTailerConfig {
    /// core 설정과 애플리케이션의 `from_beginning` 값으로 설정을 만듭니다.
    pub fn from_core(tail: &TailConfig, from_beginning: bool) -> Self {
        Self {
            from_beginning,
            poll_interval: Duration::from_millis(tail.poll_interval_ms),
            max_line_length: tail.max_line_length,
        }
    }
}

/// 수신 측 채널이 닫힘
struct Closed;

/// 열린 파일의 추적 상태
#[derive(Debug)]
struct OpenFile {
    /// 파일 핸들
    file: File,
    /// 다음 읽기 위치 (바이트 오프셋)
    offset: u64,
    /// 열 당시의 파일 식별자 (Unix에서는 inode)
    id: u64,
}

/// 파일 기반 로그 tailer
///
/// 지정된 파일을 주기적으로 폴링하여 새로운 라인을 [`TailEvent`]로 보냅니다.
/// 파일 로테이션(inode 변경, truncation)을 자동 감지합니다.
pub struct FileTailer {
    /// 감시할 파일 경로
    path: PathBuf,
    /// tailer 설정
    config: FileTailerConfig,
    /// 이벤트 전송 채널
    tx: mpsc::Sender<TailEvent>,
    /// 현재 열린 파일 (로테이션 직후에는 없을 수 있음)
    current: Option<OpenFile>,
    /// 개행이 오지 않은 미완성 라인
    pending: BytesMut,
    /// 너무 긴 라인의 나머지를 다음 개행까지 버리는 중
    discarding: bool,
}

impl FileTailer {
    /// 새 파일 tailer를 생성합니다.
    pub fn new(
        path: impl Into<PathBuf>,
        config: FileTailerConfig,
        tx: mpsc::Sender<TailEvent>,
    ) -> Self {
        Self {
            path: path.into(),
            config,
            tx,
            current: None,
            pending: BytesMut::new(),
            discarding: false,
        }
    }

    /// tailer를 실행합니다.
    ///
    /// 처음 파일을 열지 못하면 에러를 반환하고, 그 뒤로는 수신 측 채널이
    /// 닫힐 때까지 실행됩니다. `tokio::spawn`으로 별도 태스크에서 호출하세요.
    pub async fn run(mut self) -> Result<(), LogPipelineError> {
        let mut open = self.open().await.map_err(|e| LogPipelineError::LogFile {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        if !self.config.from_beginning {
            open.offset = open.file.seek(SeekFrom::End(0)).await?;
        }
        debug!(path = %self.path.display(), offset = open.offset, "tailing log file");
        self.current = Some(open);

        loop {
            if self.tx.is_closed() || self.poll().await.is_err() {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        debug!(path = %self.path.display(), "tailer stopped, receiver closed");
        Ok(())
    }

    /// 폴링 한 번: 새 데이터를 읽고 로테이션/truncation을 처리합니다.
    async fn poll(&mut self) -> Result<(), Closed> {
        if self.current.is_none() {
            match self.open().await {
                Ok(open) => {
                    info!(path = %self.path.display(), "log file reappeared, reading from start");
                    self.current = Some(open);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %self.path.display(), "log file missing, waiting");
                    return Ok(());
                }
                Err(e) => return self.report(format!("failed to reopen: {e}")).await,
            }
        }

        if let Err(e) = self.check_truncation().await {
            self.current = None;
            return self.report(format!("failed to stat: {e}")).await;
        }

        if let Err(e) = self.drain().await {
            return match e {
                DrainError::Closed => Err(Closed),
                DrainError::Io(e) => {
                    self.current = None;
                    self.report(format!("read failed: {e}")).await
                }
            };
        }

        self.check_rotation().await
    }

    /// 파일이 현재 오프셋보다 작아졌으면 처음부터 다시 읽습니다.
    async fn check_truncation(&mut self) -> std::io::Result<()> {
        let Some(open) = self.current.as_mut() else {
            return Ok(());
        };
        let len = open.file.metadata().await?.len();
        if len < open.offset {
            info!(
                path = %self.path.display(),
                previous_offset = open.offset,
                len,
                "log file truncated, restarting from beginning"
            );
            open.offset = open.file.seek(SeekFrom::Start(0)).await?;
            self.pending.clear();
            self.discarding = false;
        }
        Ok(())
    }

    /// 경로가 다른 파일을 가리키면 새 파일로 전환합니다.
    ///
    /// 호출 전에 이전 파일은 끝까지 읽혀 있어야 합니다.
    async fn check_rotation(&mut self) -> Result<(), Closed> {
        let Some(open) = self.current.as_ref() else {
            return Ok(());
        };
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // rename 후 새 파일이 생기기 전: 이전 핸들로 계속 읽음
                debug!(path = %self.path.display(), "log file moved away, waiting for new file");
                return Ok(());
            }
            Err(e) => return self.report(format!("failed to stat: {e}")).await,
        };
        if file_id(&meta) == open.id {
            return Ok(());
        }

        info!(path = %self.path.display(), "log file rotated, switching to new file");
        if !self.pending.is_empty() && !self.discarding {
            // 이전 파일의 마지막 라인에 개행이 없었음
            let rest = self.pending.split();
            self.emit_line(&rest).await?;
        }
        self.pending.clear();
        self.discarding = false;
        self.current = None;

        match self.open().await {
            Ok(open) => {
                self.current = Some(open);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => self.report(format!("failed to open rotated file: {e}")).await,
        }
    }

    /// 현재 파일을 끝까지 읽어 완성된 라인을 보냅니다.
    async fn drain(&mut self) -> Result<(), DrainError> {
        loop {
            let Some(open) = self.current.as_mut() else {
                return Ok(());
            };
            self.pending.reserve(READ_CHUNK);
            let n = open.file.read_buf(&mut self.pending).await.map_err(DrainError::Io)?;
            if n == 0 {
                return Ok(());
            }
            open.offset += n as u64;
            self.split_lines().await.map_err(|_| DrainError::Closed)?;
        }
    }

    /// 버퍼에서 개행으로 끝나는 라인을 모두 꺼내 보냅니다.
    async fn split_lines(&mut self) -> Result<(), Closed> {
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line = self.pending.split_to(pos + 1);
            line.truncate(pos);
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.emit_line(&line).await?;
        }

        if !self.discarding && self.pending.len() > self.config.max_line_length {
            let len = self.pending.len();
            self.pending.clear();
            self.discarding = true;
            return self.report(format!(
                "line exceeds max length ({len} > {} bytes), discarded",
                self.config.max_line_length
            ))
            .await;
        }
        if self.discarding {
            self.pending.clear();
        }
        Ok(())
    }

    /// 라인 하나를 검사하고 보냅니다.
    async fn emit_line(&self, raw: &[u8]) -> Result<(), Closed> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return Ok(());
        }
        if raw.len() > self.config.max_line_length {
            return self
                .report(format!(
                    "line exceeds max length ({} > {} bytes), discarded",
                    raw.len(),
                    self.config.max_line_length
                ))
                .await;
        }
        let line = String::from_utf8_lossy(raw).into_owned();
        self.tx.send(TailEvent::Line(line)).await.map_err(|_| Closed)
    }

    /// 에러 이벤트를 보냅니다.
    async fn report(&self, reason: String) -> Result<(), Closed> {
        warn!(path = %self.path.display(), %reason, "tail error");
        let err = LogPipelineError::Collector {
            source_type: format!("file:{}", self.path.display()),
            reason,
        };
        self.tx.send(TailEvent::Error(err)).await.map_err(|_| Closed)
    }

    /// 파일을 열고 오프셋 0의 추적 상태를 만듭니다.
    async fn open(&self) -> std::io::Result<OpenFile> {
        let file = File::open(&self.path).await?;
        let id = file_id(&file.metadata().await?);
        Ok(OpenFile { file, offset: 0, id })
    }

    /// 감시 중인 경로
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// drain 실패 원인
enum DrainError {
    Closed,
    Io(std::io::Error),
}

#[cfg(unix)]
fn file_id(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn file_id(_meta: &Metadata) -> u64 {
    0
}
