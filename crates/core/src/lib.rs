//! ngxlog 공통 크레이트
//!
//! nginx 액세스 로그 익스포터의 모든 크레이트가 공유하는 타입을 정의합니다.
//!
//! - [`config`]: YAML 설정 파일 및 애플리케이션 디렉토리 로딩
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, ExporterError, PipelineError};

// 설정
pub use config::{AppConfig, ExporterConfig, FilterConfig, ListenConfig, ReplaceConfig, TailConfig};
