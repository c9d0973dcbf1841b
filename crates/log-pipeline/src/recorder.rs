//! 애플리케이션별 히스토그램 세트
//!
//! [`MetricSet`]은 애플리케이션 하나의 레이블 이름 순서와 정적 레이블 값,
//! 활성화된 신호를 고정합니다. 실제 기록은 전역 `metrics` 레코더로 위임되므로
//! 같은 애플리케이션의 모든 모니터가 `Arc`로 공유해도 잠금이 필요 없습니다.
//!
//! 레이블 순서는 항상 `application`, `method`, `path`, `status`, 그리고
//! 이름 순으로 정렬된 추가 레이블입니다.

use metrics::Label;

use ngxlog_core::metrics as m;

/// 히스토그램으로 기록되는 관측 신호
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `$body_bytes_sent`
    BodyBytesSent,
    /// `$request_time`
    RequestTime,
    /// `$upstream_response_time`
    UpstreamResponseTime,
    /// `$upstream_header_time`
    UpstreamHeaderTime,
}

impl Signal {
    /// 모든 신호
    pub const ALL: [Signal; 4] = [
        Signal::BodyBytesSent,
        Signal::RequestTime,
        Signal::UpstreamResponseTime,
        Signal::UpstreamHeaderTime,
    ];

    /// Prometheus 메트릭 이름
    pub fn metric_name(self) -> &'static str {
        match self {
            Self::BodyBytesSent => m::HTTP_BODY_BYTES_SENT,
            Self::RequestTime => m::HTTP_REQUEST_TIME_SECONDS,
            Self::UpstreamResponseTime => m::HTTP_UPSTREAM_RESPONSE_TIME_SECONDS,
            Self::UpstreamHeaderTime => m::HTTP_UPSTREAM_HEADER_TIME_SECONDS,
        }
    }

    /// 값을 읽어올 로그 포맷 필드 이름
    pub fn field(self) -> &'static str {
        match self {
            Self::BodyBytesSent => "body_bytes_sent",
            Self::RequestTime => "request_time",
            Self::UpstreamResponseTime => "upstream_response_time",
            Self::UpstreamHeaderTime => "upstream_header_time",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::BodyBytesSent => 0,
            Self::RequestTime => 1,
            Self::UpstreamResponseTime => 2,
            Self::UpstreamHeaderTime => 3,
        }
    }
}

/// 라인 하나의 처리 결과 (`ngxlog_lines_total`의 `outcome` 레이블)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineOutcome {
    /// 히스토그램 기록까지 완료
    Recorded,
    /// exclude/include 규칙으로 제외
    Dropped,
    /// 포맷과 불일치
    ParseError,
    /// 요청 라인 분해 실패
    RequestError,
    /// replace 템플릿 렌더링 실패
    RenderError,
}

impl LineOutcome {
    /// 모든 결과 값
    pub const ALL: [LineOutcome; 5] = [
        LineOutcome::Recorded,
        LineOutcome::Dropped,
        LineOutcome::ParseError,
        LineOutcome::RequestError,
        LineOutcome::RenderError,
    ];

    /// 레이블 값
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Recorded => "recorded",
            Self::Dropped => "dropped",
            Self::ParseError => "parse_error",
            Self::RequestError => "request_error",
            Self::RenderError => "render_error",
        }
    }
}

impl std::fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// 애플리케이션 하나의 히스토그램 세트
#[derive(Debug, Clone)]
pub struct MetricSet {
    /// 애플리케이션 이름 (상수 레이블)
    application: String,
    /// `[method, path, status, ...extra]`
    label_names: Vec<String>,
    /// 이름 순으로 정렬된 추가 레이블 값
    extra_values: Vec<String>,
    /// 신호별 활성 여부 ([`Signal::index`] 순)
    enabled: [bool; 4],
}

impl MetricSet {
    /// 새 히스토그램 세트를 생성합니다.
    ///
    /// `extra_names`/`extra_values`는 이름 순으로 정렬되어 같은 위치끼리
    /// 짝지어져 있어야 합니다. 신호는 `grammar_fields`에 원천 필드가 있을 때만
    /// 활성화됩니다.
    pub fn new(
        application: &str,
        extra_names: &[String],
        extra_values: &[String],
        grammar_fields: &[String],
    ) -> Self {
        debug_assert_eq!(extra_names.len(), extra_values.len());

        let label_names = m::REQUEST_LABELS
            .iter()
            .map(|s| (*s).to_owned())
            .chain(extra_names.iter().cloned())
            .collect();

        let mut enabled = [false; 4];
        for signal in Signal::ALL {
            enabled[signal.index()] = grammar_fields.iter().any(|f| f == signal.field());
        }

        Self {
            application: application.to_owned(),
            label_names,
            extra_values: extra_values.to_vec(),
            enabled,
        }
    }

    /// 애플리케이션 이름
    pub fn application(&self) -> &str {
        &self.application
    }

    /// 요청 레이블 이름 순서 (`application` 제외)
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// 신호 활성 여부
    pub fn is_enabled(&self, signal: Signal) -> bool {
        self.enabled[signal.index()]
    }

    /// 활성화된 신호 목록
    pub fn enabled_signals(&self) -> Vec<Signal> {
        Signal::ALL.into_iter().filter(|s| self.is_enabled(*s)).collect()
    }

    /// 라인 하나의 레이블 벡터를 만듭니다. `application`이 맨 앞입니다.
    pub fn labels(&self, method: &str, path: &str, status: &str) -> Vec<Label> {
        let mut labels = Vec::with_capacity(self.label_names.len() + 1);
        labels.push(Label::new(m::LABEL_APPLICATION, self.application.clone()));
        labels.push(Label::new(m::LABEL_METHOD, method.to_owned()));
        labels.push(Label::new(m::LABEL_PATH, path.to_owned()));
        labels.push(Label::new(m::LABEL_STATUS, status.to_owned()));
        for (name, value) in self.label_names[m::REQUEST_LABELS.len()..]
            .iter()
            .zip(&self.extra_values)
        {
            labels.push(Label::new(name.clone(), value.clone()));
        }
        labels
    }

    /// 활성화된 신호면 히스토그램에 값을 기록합니다.
    pub fn observe(&self, signal: Signal, labels: &[Label], value: f64) {
        if !self.is_enabled(signal) {
            return;
        }
        metrics::histogram!(signal.metric_name(), labels.to_vec()).record(value);
    }

    /// 라인 처리 결과를 센다.
    pub fn count_line(&self, outcome: LineOutcome) {
        metrics::counter!(
            m::LINES_TOTAL,
            m::LABEL_APPLICATION => self.application.clone(),
            m::LABEL_OUTCOME => outcome.as_label()
        )
        .increment(1);
    }

    /// 숫자 필드 파싱 실패를 센다.
    pub fn count_field_error(&self, field: &'static str) {
        metrics::counter!(
            m::FIELD_ERRORS_TOTAL,
            m::LABEL_APPLICATION => self.application.clone(),
            m::LABEL_FIELD => field
        )
        .increment(1);
    }

    /// tail 에러를 센다.
    pub fn count_tail_error(&self) {
        metrics::counter!(
            m::TAIL_ERRORS_TOTAL,
            m::LABEL_APPLICATION => self.application.clone()
        )
        .increment(1);
    }
}
