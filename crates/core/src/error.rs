//! 에러 타입 -- 도메인별 에러 정의

/// ngxlog 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 초기화/처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config {source_name}: {reason}")]
    ParseFailed { source_name: String, reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패 (정규식, 템플릿, 포맷 컴파일 등)
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 설정된 로그 파일에 접근할 수 없음
    #[error("log file {path}: {reason}")]
    LogFileUnavailable { path: String, reason: String },
}
