//! 로그 수집 모듈 -- 액세스 로그 파일을 tail 합니다.
//!
//! # 수집 소스
//! - [`FileTailer`]: 파일 감시 (`tail -F` 방식, 로테이션/truncation 감지)
//!
//! # 아키텍처
//! 각 tailer는 자체 tokio 태스크에서 실행되며, 읽은 라인을
//! `tokio::mpsc::Sender<TailEvent>` 채널을 통해 파일 모니터로 전달합니다.
//! 수신 측이 닫히면 tailer도 종료됩니다.

pub mod file;

pub use file::{FileTailer, FileTailerConfig};

use crate::error::LogPipelineError;

/// tailer와 모니터 사이 채널 용량
pub const TAIL_CHANNEL_CAPACITY: usize = 1024;

/// tailer가 모니터로 보내는 이벤트
#[derive(Debug)]
pub enum TailEvent {
    /// 개행과 `\r`이 제거된 완전한 라인
    Line(String),
    /// 읽기 중 발생한 에러 (tailer는 계속 실행됨)
    Error(LogPipelineError),
}
