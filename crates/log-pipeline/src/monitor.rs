//! 파일 모니터 -- 파일 하나당 하나씩 실행되는 라인 처리 워커
//!
//! [`FileMonitor`]는 [`FileTailer`]가 보낸 라인을 받아
//! 포맷 파싱, 요청 분해, 경로 분류, 히스토그램 기록을 순서대로 수행합니다.
//!
//! 라인 단위 에러는 경고 로그와 카운터만 남기고 다음 라인으로 넘어갑니다.
//! 워커를 종료시키는 것은 채널이 닫히는 경우뿐입니다.
//!
//! # 내부 아키텍처
//! ```text
//! FileTailer -> mpsc(1024) -> FileMonitor::run -> process_line
//!                                                   |
//!                 grammar.parse -> decompose_request -> rules.classify -> metrics.observe
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use ngxlog_core::config::TailConfig;
use ngxlog_core::metrics as m;

use crate::collector::{FileTailer, FileTailerConfig, TAIL_CHANNEL_CAPACITY, TailEvent};
use crate::error::LogPipelineError;
use crate::parser::{decompose_request, parse_upstream_time};
use crate::profile::ApplicationProfile;
use crate::recorder::{LineOutcome, Signal};
use crate::rule::{Classification, DropReason};

/// 모니터 하나가 처리한 라인 수 집계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// [`LineOutcome::ALL`] 순서의 결과별 라인 수
    outcomes: [u64; 5],
    /// 받은 tail 에러 이벤트 수
    pub tail_errors: u64,
}

impl MonitorSummary {
    fn record(&mut self, outcome: LineOutcome) {
        if let Some(idx) = LineOutcome::ALL.iter().position(|o| *o == outcome) {
            self.outcomes[idx] += 1;
        }
    }

    /// 해당 결과의 라인 수
    pub fn count(&self, outcome: LineOutcome) -> u64 {
        LineOutcome::ALL
            .iter()
            .position(|o| *o == outcome)
            .map_or(0, |idx| self.outcomes[idx])
    }

    /// 처리한 전체 라인 수
    pub fn total_lines(&self) -> u64 {
        self.outcomes.iter().sum()
    }
}

/// 파일 하나를 담당하는 라인 처리 워커
pub struct FileMonitor {
    /// 애플리케이션 프로파일 (같은 애플리케이션의 모니터끼리 공유)
    profile: Arc<ApplicationProfile>,
    /// 담당 로그 파일
    path: PathBuf,
    /// 처리 집계
    summary: MonitorSummary,
}

impl FileMonitor {
    /// 새 모니터를 생성합니다.
    pub fn new(profile: Arc<ApplicationProfile>, path: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            path: path.into(),
            summary: MonitorSummary::default(),
        }
    }

    /// tailer와 모니터 태스크를 함께 띄웁니다.
    ///
    /// 두 태스크는 용량 [`TAIL_CHANNEL_CAPACITY`]의 채널로 연결됩니다.
    /// tailer가 시작에 실패하면 채널이 닫히고 모니터도 종료됩니다.
    pub fn spawn(
        profile: Arc<ApplicationProfile>,
        path: PathBuf,
        tail: &TailConfig,
    ) -> Vec<JoinHandle<()>> {
        let (tx, rx) = mpsc::channel(TAIL_CHANNEL_CAPACITY);
        let config = FileTailerConfig::from_core(tail, profile.from_beginning);
        let tailer = FileTailer::new(path.clone(), config, tx);

        let application = profile.name.clone();
        let tailer_task = tokio::spawn(async move {
            let file = tailer.path().display().to_string();
            if let Err(e) = tailer.run().await {
                error!(application, file, error = %e, "tailer stopped");
            }
        });

        let monitor = Self::new(profile, path);
        let monitor_task = tokio::spawn(async move {
            monitor.run(rx).await;
        });

        vec![tailer_task, monitor_task]
    }

    /// 채널이 닫힐 때까지 이벤트를 처리하고 집계를 반환합니다.
    pub async fn run(mut self, mut rx: mpsc::Receiver<TailEvent>) -> MonitorSummary {
        info!(
            application = %self.profile.name,
            file = %self.path.display(),
            "file monitor started"
        );
        metrics::gauge!(m::MONITORED_FILES).increment(1.0);

        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }

        metrics::gauge!(m::MONITORED_FILES).decrement(1.0);
        info!(
            application = %self.profile.name,
            file = %self.path.display(),
            lines = self.summary.total_lines(),
            "file monitor stopped"
        );
        self.summary
    }

    /// tail 이벤트 하나를 처리합니다.
    pub fn handle_event(&mut self, event: TailEvent) {
        match event {
            TailEvent::Line(line) => {
                self.process_line(&line);
            }
            TailEvent::Error(e) => {
                warn!(
                    application = %self.profile.name,
                    file = %self.path.display(),
                    error = %e,
                    "error while tailing log file"
                );
                self.summary.tail_errors += 1;
                self.profile.metrics.count_tail_error();
            }
        }
    }

    /// 라인 하나를 파싱하고 히스토그램에 기록합니다.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let outcome = self.observe_line(line);
        self.summary.record(outcome);
        self.profile.metrics.count_line(outcome);
        outcome
    }

    fn observe_line(&self, line: &str) -> LineOutcome {
        let profile = &*self.profile;

        let fields = match profile.grammar.parse(line) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(application = %profile.name, file = %self.path.display(), error = %e, "failed to parse access log line");
                return LineOutcome::ParseError;
            }
        };

        let mut method = "";
        let mut path = String::new();
        let mut status = "";

        if let Some(request) = fields.field("request") {
            let (req_method, req_path) = match decompose_request(request) {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(application = %profile.name, file = %self.path.display(), error = %e, "failed to decompose request");
                    return LineOutcome::RequestError;
                }
            };

            match profile.rules.classify(req_method, &req_path) {
                Classification::Keep(final_path) => {
                    method = req_method;
                    path = final_path;
                }
                Classification::Drop(reason) => {
                    match reason {
                        DropReason::Excluded(idx) => {
                            debug!(application = %profile.name, path = %req_path, rule = idx, "excluded")
                        }
                        DropReason::NotIncluded => {
                            debug!(application = %profile.name, path = %req_path, "not included")
                        }
                    }
                    return LineOutcome::Dropped;
                }
                Classification::RenderFailed(e) => {
                    warn!(application = %profile.name, path = %req_path, error = %e, "failed to rewrite path");
                    return LineOutcome::RenderError;
                }
            }
        }

        if let Some(value) = fields.field("status") {
            status = value;
        }

        let metrics = &profile.metrics;
        let labels = metrics.labels(method, &path, status);

        if let Some(bytes) = fields.float_field(Signal::BodyBytesSent.field()) {
            metrics.observe(Signal::BodyBytesSent, &labels, bytes);
        }

        for signal in [Signal::UpstreamResponseTime, Signal::UpstreamHeaderTime] {
            let Some(raw) = fields.field(signal.field()) else {
                continue;
            };
            match parse_upstream_time(signal.field(), raw) {
                Ok(seconds) => metrics.observe(signal, &labels, seconds),
                Err(e) => {
                    warn!(application = %profile.name, file = %self.path.display(), error = %e, "failed to parse upstream time");
                    metrics.count_field_error(signal.field());
                }
            }
        }

        if let Some(seconds) = fields.float_field(Signal::RequestTime.field()) {
            metrics.observe(Signal::RequestTime, &labels, seconds);
        }

        LineOutcome::Recorded
    }

    /// 지금까지의 처리 집계
    pub fn summary(&self) -> &MonitorSummary {
        &self.summary
    }

    /// 담당 로그 파일
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 로그 파일을 읽기용으로 열 수 있고 일반 파일인지 확인합니다.
///
/// 시작 시점에 모든 로그 파일에 대해 호출되며, 실패는 프로세스 시작을 막습니다.
pub async fn verify_log_file(path: &Path) -> Result<(), LogPipelineError> {
    let log_file_err = |reason: String| LogPipelineError::LogFile {
        path: path.display().to_string(),
        reason,
    };

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| log_file_err(e.to_string()))?;
    let meta = file.metadata().await.map_err(|e| log_file_err(e.to_string()))?;
    if !meta.is_file() {
        return Err(log_file_err("not a regular file".to_owned()));
    }
    Ok(())
}
