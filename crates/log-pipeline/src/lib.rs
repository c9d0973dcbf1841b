//! ngxlog 액세스 로그 파이프라인
//!
//! nginx 액세스 로그 한 줄을 받아 필드를 추출하고, 요청 경로를 분류/치환한 뒤
//! 애플리케이션별 히스토그램에 관측값을 기록합니다.
//!
//! # 모듈 구성
//!
//! - [`parser`]: nginx `log_format` 문법 컴파일, 요청 라인 분해
//! - [`rule`]: exclude/include/replace 경로 규칙 및 경로 분류기
//! - [`recorder`]: 애플리케이션별 히스토그램 세트와 레이블 벡터
//! - [`profile`]: 설정에서 컴파일된 애플리케이션 프로파일
//! - [`collector`]: 파일 tail (로테이션/truncation 감지)
//! - [`monitor`]: 파일당 하나씩 실행되는 라인 처리 워커
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileTailer -> mpsc -> FileMonitor -> AccessLogGrammar -> decompose_request
//!                                          |                    |
//!                                       FieldMap            RuleSet.classify
//!                                          |                    |
//!                                          +-----> MetricSet.observe
//! ```

pub mod collector;
pub mod error;
pub mod monitor;
pub mod parser;
pub mod profile;
pub mod recorder;
pub mod rule;

// --- 주요 타입 re-export ---

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{AccessLogGrammar, FieldMap, decompose_request, parse_upstream_time};

// 규칙
pub use rule::{Classification, DropReason, FilterRule, PathTemplate, ReplaceRule, RuleSet};

// 메트릭
pub use recorder::{LineOutcome, MetricSet, Signal};

// 프로파일
pub use profile::ApplicationProfile;

// 수집기
pub use collector::{FileTailer, FileTailerConfig, TailEvent};

// 모니터
pub use monitor::{FileMonitor, MonitorSummary, verify_log_file};
