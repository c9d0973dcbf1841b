//! 통합 테스트 -- 액세스 로그 라인부터 히스토그램 기록까지의 전체 흐름 검증
//!
//! 메트릭은 `metrics-util`의 `DebuggingRecorder`로, 경고 로그는
//! 테스트 전용 tracing 레이어로 캡처합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use ngxlog_core::config::{AppConfig, FilterConfig, ReplaceConfig, TailConfig};
use ngxlog_core::metrics as m;
use ngxlog_log_pipeline::{
    ApplicationProfile, FileMonitor, FileTailer, FileTailerConfig, LineOutcome, TailEvent,
};

const FORMAT: &str = r#"$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent"#;

const API_LINE: &str =
    r#"192.0.2.10 - - [15/Jan/2024:12:00:00 +0000] "GET /api/x?y=1 HTTP/1.1" 200 512"#;

/// WARN 이벤트 수를 세는 레이어
#[derive(Clone, Default)]
struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn app_config(include: &[&str], exclude: &[&str]) -> AppConfig {
    let filters = |paths: &[&str]| {
        paths
            .iter()
            .map(|p| FilterConfig {
                path: (*p).to_owned(),
                methods: vec![],
            })
            .collect()
    };
    AppConfig {
        format: FORMAT.to_owned(),
        log_files: vec!["/var/log/nginx/access.log".to_owned()],
        include: filters(include),
        exclude: filters(exclude),
        ..Default::default()
    }
}

fn monitor_for(name: &str, config: &AppConfig) -> FileMonitor {
    let profile = ApplicationProfile::compile(name, config).expect("profile compiles");
    FileMonitor::new(Arc::new(profile), "/var/log/nginx/access.log")
}

/// (레이블, 값 목록) 형태로 히스토그램을 꺼냅니다.
fn histograms(snapshotter: &Snapshotter, name: &str) -> Vec<(Vec<(String, String)>, Vec<f64>)> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| key.key().name() == name)
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Histogram(values) => Some((
                key.key()
                    .labels()
                    .map(|l| (l.key().to_owned(), l.value().to_owned()))
                    .collect(),
                values.into_iter().map(|v| v.into_inner()).collect(),
            )),
            _ => None,
        })
        .collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn included_line_records_one_body_bytes_observation() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let mut monitor = monitor_for("api", &app_config(&["^/api/"], &[]));

    metrics::with_local_recorder(&recorder, || monitor.process_line(API_LINE));

    let observed = histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT);
    assert_eq!(observed.len(), 1);
    assert_eq!(
        observed[0].0,
        pairs(&[
            ("application", "api"),
            ("method", "GET"),
            ("path", "/api/x"),
            ("status", "200"),
        ])
    );
    assert_eq!(observed[0].1, vec![512.0]);
}

#[test]
fn excluded_line_records_no_observation() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let mut monitor = monitor_for("api", &app_config(&[], &["^/api/"]));

    let outcome = metrics::with_local_recorder(&recorder, || monitor.process_line(API_LINE));

    assert_eq!(outcome, LineOutcome::Dropped);
    assert!(histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT).is_empty());
}

#[test]
fn malformed_line_warns_once_and_processing_continues() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let warns = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(warns.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut monitor = monitor_for("api", &app_config(&[], &[]));

    metrics::with_local_recorder(&recorder, || {
        assert_eq!(monitor.process_line("definitely not nginx"), LineOutcome::ParseError);
        assert_eq!(monitor.process_line(API_LINE), LineOutcome::Recorded);
    });

    assert_eq!(warns.count.load(Ordering::SeqCst), 1);
    let observed = histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT);
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].1.len(), 1);
}

#[test]
fn label_vectors_are_identical_across_files() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let config = AppConfig {
        labels: [("team", "core"), ("env", "prod")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
        ..app_config(&[], &[])
    };
    let profile = Arc::new(ApplicationProfile::compile("api", &config).unwrap());
    let mut first = FileMonitor::new(profile.clone(), "/var/log/nginx/a.log");
    let mut second = FileMonitor::new(profile, "/var/log/nginx/b.log");

    metrics::with_local_recorder(&recorder, || {
        first.process_line(API_LINE);
        second.process_line(API_LINE);
    });

    // 같은 레이블 벡터면 하나의 시계열로 합쳐짐
    let observed = histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT);
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].1.len(), 2);
    assert_eq!(
        observed[0].0,
        pairs(&[
            ("application", "api"),
            ("method", "GET"),
            ("path", "/api/x"),
            ("status", "200"),
            ("env", "prod"),
            ("team", "core"),
        ])
    );
}

#[test]
fn replace_template_rewrites_path_label() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let config = AppConfig {
        replace: vec![ReplaceConfig {
            path: r"^/users/(?P<id>\d+)/(?P<tab>\w+)$".to_owned(),
            methods: vec!["GET".to_owned()],
            with: "/users/:id/{{ .tab }}".to_owned(),
        }],
        ..app_config(&[], &[])
    };
    let mut monitor = monitor_for("users", &config);

    metrics::with_local_recorder(&recorder, || {
        monitor.process_line(
            r#"192.0.2.10 - - [15/Jan/2024:12:00:00 +0000] "GET /users/981/orders HTTP/1.1" 200 64"#,
        );
    });

    let observed = histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT);
    assert_eq!(observed.len(), 1);
    assert!(
        observed[0]
            .0
            .contains(&("path".to_owned(), "/users/:id/orders".to_owned()))
    );
}

#[test]
fn render_failure_warns_and_records_outcome() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let warns = WarnCounter::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(warns.clone()));

    let config = AppConfig {
        replace: vec![ReplaceConfig {
            path: r"^/api/(?P<name>\w+)$".to_owned(),
            methods: vec![],
            with: "/api/{{.resource}}".to_owned(),
        }],
        ..app_config(&[], &[])
    };
    let mut monitor = monitor_for("api", &config);

    let outcome = metrics::with_local_recorder(&recorder, || monitor.process_line(API_LINE));
    assert_eq!(outcome, LineOutcome::RenderError);
    assert_eq!(warns.count.load(Ordering::SeqCst), 1);

    let snapshot = snapshotter.snapshot().into_vec();
    let render_errors = snapshot.iter().find(|(key, _, _, _)| {
        key.key().name() == m::LINES_TOTAL
            && key
                .key()
                .labels()
                .any(|l| l.key() == "outcome" && l.value() == "render_error")
    });
    assert!(matches!(render_errors, Some((_, _, _, DebugValue::Counter(1)))));
    assert!(
        !snapshot
            .iter()
            .any(|(key, _, _, _)| key.key().name() == m::HTTP_BODY_BYTES_SENT)
    );
}

#[tokio::test(flavor = "current_thread")]
async fn tailed_file_flows_into_histograms() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let _recorder_guard = metrics::set_default_local_recorder(&recorder);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.log");
    std::fs::write(&path, format!("{API_LINE}\ngarbage\n{API_LINE}\n")).unwrap();

    let config = AppConfig {
        from_beginning: true,
        log_files: vec![path.display().to_string()],
        ..app_config(&[], &[])
    };
    let profile = Arc::new(ApplicationProfile::compile("api", &config).unwrap());
    let tail = TailConfig {
        poll_interval_ms: 10,
        max_line_length: 4096,
    };

    let (tx, rx) = mpsc::channel::<TailEvent>(16);
    let tailer = FileTailer::new(&path, FileTailerConfig::from_core(&tail, true), tx);
    let tailer_task = tokio::spawn(tailer.run());

    // tailer가 세 줄을 보낼 시간을 준 뒤 채널을 닫기 위해 tailer를 중단
    tokio::time::sleep(Duration::from_millis(200)).await;
    tailer_task.abort();

    let summary = FileMonitor::new(profile, &path).run(rx).await;
    assert_eq!(summary.count(LineOutcome::Recorded), 2);
    assert_eq!(summary.count(LineOutcome::ParseError), 1);

    let observed = histograms(&snapshotter, m::HTTP_BODY_BYTES_SENT);
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].1, vec![512.0, 512.0]);
}
