//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for ExporterError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 시작 시점 에러(컴파일, 로그 파일 접근)는 프로세스를 중단시키고,
//! 라인 단위 에러(파싱, 요청 분해, 렌더링)는 모니터 안에서 로그만 남깁니다.

use ngxlog_core::error::{ExporterError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 로그 포맷 문법 컴파일 실패
    #[error("invalid log format '{format}': {reason}")]
    Grammar {
        /// 설정된 포맷 문자열
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 로그 라인이 포맷과 일치하지 않음
    #[error("access log line '{line}' does not match given format '{format}'")]
    Parse {
        /// 원본 라인
        line: String,
        /// 포맷 문자열
        format: String,
    },

    /// 요청 라인이 `METHOD PATH ...` 형태가 아님
    #[error("{0}: invalid request")]
    MalformedRequest(String),

    /// 요청 경로 퍼센트 디코딩 실패
    #[error("invalid escape in path '{path}': {reason}")]
    PathDecode {
        /// 원본 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 숫자 필드 파싱 실패 (업스트림 시간 등)
    #[error("field '{field}': '{value}' is not a number")]
    InvalidNumber {
        /// 필드 이름
        field: String,
        /// 파싱하지 못한 값
        value: String,
    },

    /// 경로 규칙 정규식 컴파일 실패
    #[error("invalid path pattern '{pattern}': {reason}")]
    RuleCompile {
        /// 정규식 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 치환 템플릿 컴파일 실패
    #[error("invalid template '{template}': {reason}")]
    TemplateCompile {
        /// 템플릿 원문
        template: String,
        /// 실패 사유
        reason: String,
    },

    /// 치환 템플릿 렌더링 실패
    #[error("failed to render template '{template}': {reason}")]
    TemplateRender {
        /// 템플릿 원문
        template: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러 (프로파일 컴파일 시 필드 위치 포함)
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드 경로
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정된 로그 파일을 열 수 없음
    #[error("log file {path}: {reason}")]
    LogFile {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 수집기 에러 (파일 I/O 등)
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 수집 소스 식별자
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LogPipelineError> for ExporterError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::LogFile { path, reason } => {
                ExporterError::Pipeline(PipelineError::LogFileUnavailable { path, reason })
            }
            other => ExporterError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
