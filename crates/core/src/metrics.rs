//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! log-pipeline은 이 상수를 사용하여 `metrics::histogram!()`,
//! `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 액세스 로그 히스토그램: `nginx_http_` 접두어 (기존 대시보드 호환)
//! - 익스포터 자체 메트릭: `ngxlog_` 접두어
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 애플리케이션 레이블 키 (모든 메트릭에 상수로 부착)
pub const LABEL_APPLICATION: &str = "application";

/// HTTP 메서드 레이블 키
pub const LABEL_METHOD: &str = "method";

/// 요청 경로 레이블 키 (include/replace 적용 후)
pub const LABEL_PATH: &str = "path";

/// HTTP 상태 코드 레이블 키
pub const LABEL_STATUS: &str = "status";

/// 라인 처리 결과 레이블 키 (recorded, dropped, parse_error, ...)
pub const LABEL_OUTCOME: &str = "outcome";

/// 로그 필드 이름 레이블 키
pub const LABEL_FIELD: &str = "field";

/// 요청 단위 레이블 (순서 고정, 추가 레이블은 이 뒤에 이름 순으로 붙음)
pub const REQUEST_LABELS: [&str; 3] = [LABEL_METHOD, LABEL_PATH, LABEL_STATUS];

/// 애플리케이션 설정의 추가 레이블로 사용할 수 없는 이름
pub const RESERVED_LABELS: [&str; 4] = [LABEL_APPLICATION, LABEL_METHOD, LABEL_PATH, LABEL_STATUS];

// ─── 액세스 로그 히스토그램 ────────────────────────────────────────

/// 클라이언트로 전송된 본문 바이트 수 (histogram)
pub const HTTP_BODY_BYTES_SENT: &str = "nginx_http_body_bytes_sent";

/// 요청 처리 시간 (histogram, 초)
pub const HTTP_REQUEST_TIME_SECONDS: &str = "nginx_http_request_time_seconds";

/// 업스트림 응답 수신 시간 (histogram, 초)
pub const HTTP_UPSTREAM_RESPONSE_TIME_SECONDS: &str = "nginx_http_upstream_response_time_seconds";

/// 업스트림 응답 헤더 첫 바이트 수신 시간 (histogram, 초)
pub const HTTP_UPSTREAM_HEADER_TIME_SECONDS: &str = "nginx_http_upstream_header_time_seconds";

/// 모든 액세스 로그 히스토그램 이름
pub const HTTP_HISTOGRAMS: [&str; 4] = [
    HTTP_BODY_BYTES_SENT,
    HTTP_REQUEST_TIME_SECONDS,
    HTTP_UPSTREAM_RESPONSE_TIME_SECONDS,
    HTTP_UPSTREAM_HEADER_TIME_SECONDS,
];

// ─── 익스포터 자체 메트릭 ──────────────────────────────────────────

/// 처리 결과별 라인 수 (counter, labels: application, outcome)
pub const LINES_TOTAL: &str = "ngxlog_lines_total";

/// 숫자 필드 파싱 실패 수 (counter, labels: application, field)
pub const FIELD_ERRORS_TOTAL: &str = "ngxlog_field_errors_total";

/// 파일 tail 읽기 에러 수 (counter, label: application)
pub const TAIL_ERRORS_TOTAL: &str = "ngxlog_tail_errors_total";

/// 실행 중인 파일 모니터 수 (gauge)
pub const MONITORED_FILES: &str = "ngxlog_monitored_files";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 애플리케이션에 버킷이 설정되지 않았을 때의 기본 버킷
///
/// Prometheus 클라이언트 라이브러리의 기본값과 동일합니다.
pub const DEFAULT_HISTOGRAM_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_histogram!(
        HTTP_BODY_BYTES_SENT,
        metrics::Unit::Bytes,
        "Number of body bytes sent to the client"
    );
    describe_histogram!(
        HTTP_REQUEST_TIME_SECONDS,
        metrics::Unit::Seconds,
        "Time spent on processing HTTP requests"
    );
    describe_histogram!(
        HTTP_UPSTREAM_RESPONSE_TIME_SECONDS,
        metrics::Unit::Seconds,
        "Time spent on receiving a response from upstream servers"
    );
    describe_histogram!(
        HTTP_UPSTREAM_HEADER_TIME_SECONDS,
        metrics::Unit::Seconds,
        "Time to receiving the first byte of the response header from upstream servers"
    );

    describe_counter!(
        LINES_TOTAL,
        "Access log lines processed, by outcome (recorded, dropped, parse_error, request_error, render_error)"
    );
    describe_counter!(
        FIELD_ERRORS_TOTAL,
        "Numeric access log fields that could not be parsed"
    );
    describe_counter!(TAIL_ERRORS_TOTAL, "Errors reported while tailing log files");
    describe_gauge!(MONITORED_FILES, "Number of log files currently monitored");
}
