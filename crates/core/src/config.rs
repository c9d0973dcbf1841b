//! 설정 관리 -- ngxlog.yaml 및 애플리케이션 디렉토리 파싱
//!
//! [`ExporterConfig`]는 익스포터 전체 설정을 담는 최상위 구조체입니다.
//! 애플리케이션 설정은 메인 파일의 `applications` 섹션과
//! `app_dir` 디렉토리의 `<이름>.yaml` 파일에서 모두 읽을 수 있습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, daemon에서 적용)
//! 2. 환경변수 (`NGXLOG_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`ngxlog.yaml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ngxlog_core::error::ExporterError> {
//! use ngxlog_core::config::ExporterConfig;
//!
//! let config = ExporterConfig::load("ngxlog.yaml").await?;
//! for (name, app) in &config.applications {
//!     println!("{name}: {} files", app.log_files.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ExporterError};
use crate::metrics::{DEFAULT_HISTOGRAM_BUCKETS, RESERVED_LABELS};

/// 애플리케이션 설정 파일 확장자
const APP_FILE_EXTENSION: &str = "yaml";

/// 설정 파일 최대 크기
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 허용되는 로그 레벨 (대소문자 무시)
const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// 허용되는 로그 형식
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// ngxlog 통합 설정
///
/// `ngxlog.yaml` 파일의 최상위 구조를 나타냅니다.
/// 알 수 없는 키는 거부됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterConfig {
    /// 로그 레벨 (trace, debug, info, warn/warning, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 스크레이프 HTTP 리스너 설정
    pub listen: ListenConfig,
    /// 애플리케이션별 설정 파일 디렉토리
    pub app_dir: Option<String>,
    /// 파일 tail 설정
    pub tail: TailConfig,
    /// 애플리케이션 설정 (이름 -> 설정)
    pub applications: BTreeMap<String, AppConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            listen: ListenConfig::default(),
            app_dir: None,
            tail: TailConfig::default(),
            applications: BTreeMap::new(),
        }
    }
}

impl ExporterConfig {
    /// 설정 파일을 로드하고 환경변수 오버라이드, 애플리케이션 디렉토리
    /// 병합, 유효성 검증을 순서대로 수행합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ExporterError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.load_app_dir().await?;
        config.validate()?;
        Ok(config)
    }

    /// YAML 파일에서 설정을 읽습니다 (오버라이드/검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ExporterError> {
        let path = path.as_ref();
        let content = read_config_file(path).await?;
        Ok(Self::parse(&content, &path.display().to_string())?)
    }

    /// YAML 문자열에서 설정을 파싱합니다.
    pub fn parse(yaml_str: &str, source_name: &str) -> Result<Self, ConfigError> {
        // 빈 파일은 기본값으로 취급
        if yaml_str.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseFailed {
            source_name: source_name.to_owned(),
            reason: e.to_string(),
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `NGXLOG_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.log_level, "NGXLOG_LOG_LEVEL");
        override_string(&mut self.log_format, "NGXLOG_LOG_FORMAT");
        override_string(&mut self.listen.address, "NGXLOG_LISTEN_ADDRESS");
        override_u16(&mut self.listen.port, "NGXLOG_LISTEN_PORT");
        if let Ok(dir) = std::env::var("NGXLOG_APP_DIR") {
            self.app_dir = Some(dir);
        }
    }

    /// `app_dir`의 `*.yaml` 파일을 애플리케이션 설정으로 병합합니다.
    ///
    /// 파일명(확장자 제외)이 애플리케이션 이름이 됩니다.
    /// 심볼릭 링크는 따라가며, 일반 파일이 아니면 건너뜁니다.
    pub async fn load_app_dir(&mut self) -> Result<(), ExporterError> {
        let Some(dir) = self.app_dir.clone() else {
            return Ok(());
        };

        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            ConfigError::InvalidValue {
                field: "app_dir".to_owned(),
                reason: format!("failed to read directory '{dir}': {e}"),
            }
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == APP_FILE_EXTENSION);
            if !is_yaml {
                continue;
            }

            // metadata()는 심볼릭 링크를 따라갑니다
            let metadata = tokio::fs::metadata(&path).await?;
            if !metadata.is_file() {
                continue;
            }
            files.push(path);
        }
        // 디렉토리 순회 순서는 플랫폼마다 다르므로 정렬
        files.sort();

        for path in files {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let content = read_config_file(&path).await?;
            let app = AppConfig::parse(&content, &path.display().to_string())?;

            if self.applications.contains_key(&name) {
                return Err(ConfigError::InvalidValue {
                    field: format!("applications.{name}"),
                    reason: format!(
                        "application defined twice (inline and in {})",
                        path.display()
                    ),
                }
                .into());
            }

            tracing::debug!(application = %name, path = %path.display(), "loaded application config");
            self.applications.insert(name, app);
        }

        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracing_level()?;

        if !VALID_LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            });
        }

        self.listen.validate()?;
        self.tail.validate()?;

        for (name, app) in &self.applications {
            app.validate(name)?;
        }

        Ok(())
    }

    /// `tracing` 필터 형식의 로그 레벨을 반환합니다.
    ///
    /// `WARNING`처럼 대문자나 별칭으로 적어도 허용합니다.
    pub fn tracing_level(&self) -> Result<&'static str, ConfigError> {
        let level = self.log_level.to_ascii_lowercase();
        match level.as_str() {
            "trace" => Ok("trace"),
            "debug" => Ok("debug"),
            "info" => Ok("info"),
            "warn" | "warning" => Ok("warn"),
            "error" => Ok("error"),
            _ => Err(ConfigError::InvalidValue {
                field: "log_level".to_owned(),
                reason: format!(
                    "'{}' is not valid, must be one of: {}",
                    self.log_level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            }),
        }
    }

    /// 모든 애플리케이션의 로그 파일 수를 반환합니다.
    pub fn log_file_count(&self) -> usize {
        self.applications.values().map(|a| a.log_files.len()).sum()
    }
}

/// 스크레이프 HTTP 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    /// 바인드 주소
    pub address: String,
    /// 바인드 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 9900,
            endpoint: "/metrics".to_owned(),
        }
    }
}

impl ListenConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "listen.address".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "listen.port".to_owned(),
                reason: "must be 1-65535".to_owned(),
            });
        }
        if !self.endpoint.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "listen.endpoint".to_owned(),
                reason: format!("'{}' must start with '/'", self.endpoint),
            });
        }
        Ok(())
    }
}

/// 파일 tail 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TailConfig {
    /// 파일 변경 확인 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

impl TailConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000;

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidValue {
                field: "tail.poll_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            });
        }
        if self.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tail.max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

/// 단일 nginx "애플리케이션" 설정
///
/// # YAML 스키마
/// ```yaml
/// format: '$remote_addr - [$time_local] "$request" $status $body_bytes_sent'
/// from_beginning: false
/// labels:
///   env: prod
/// log_files:
///   - /var/log/nginx/access.log
/// histogram_buckets: [0.01, 0.1, 1]
/// exclude:
///   - path: '^/health'
/// include:
///   - path: '^/api/'
///     methods: [GET, POST]
/// replace:
///   - path: '^/users/(?P<id>\d+)$'
///     with: '/users/:id'
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// nginx `log_format` 문자열
    pub format: String,
    /// 파일 처음부터 읽을지 여부 (기본: 끝에서 시작)
    #[serde(default)]
    pub from_beginning: bool,
    /// 추가 정적 레이블 (키 정렬 순서로 사용)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// 감시할 로그 파일 (절대 경로)
    #[serde(default)]
    pub log_files: Vec<String>,
    /// 히스토그램 버킷 (비어 있으면 기본 버킷)
    #[serde(default)]
    pub histogram_buckets: Vec<f64>,
    /// 제외 필터
    #[serde(default)]
    pub exclude: Vec<FilterConfig>,
    /// 포함 필터
    #[serde(default)]
    pub include: Vec<FilterConfig>,
    /// 경로 치환 규칙
    #[serde(default)]
    pub replace: Vec<ReplaceConfig>,
}

impl AppConfig {
    /// YAML 문자열에서 애플리케이션 설정을 파싱합니다.
    pub fn parse(yaml_str: &str, source_name: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseFailed {
            source_name: source_name.to_owned(),
            reason: e.to_string(),
        })
    }

    /// 레이블 이름과 값을 이름 순으로 정렬해 반환합니다.
    ///
    /// 같은 애플리케이션의 모든 파일 모니터가 동일한 위치 순서로
    /// 레이블 벡터를 만들도록 보장합니다.
    pub fn ordered_labels(&self) -> (Vec<String>, Vec<String>) {
        // BTreeMap은 키 순으로 순회
        self.labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unzip()
    }

    /// 히스토그램 버킷을 반환합니다. 설정이 없으면 기본 버킷을 사용합니다.
    pub fn buckets(&self) -> Vec<f64> {
        if self.histogram_buckets.is_empty() {
            DEFAULT_HISTOGRAM_BUCKETS.to_vec()
        } else {
            self.histogram_buckets.clone()
        }
    }

    /// 애플리케이션 설정의 유효성을 검증합니다.
    ///
    /// 정규식/템플릿 컴파일은 log-pipeline의 프로파일 컴파일 단계에서 수행됩니다.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let field = |suffix: &str| format!("applications.{name}.{suffix}");

        if self.format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("format"),
                reason: "must not be empty".to_owned(),
            });
        }

        for lf in &self.log_files {
            if !Path::new(lf).is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: field("log_files"),
                    reason: format!("log file '{lf}': not an absolute path"),
                });
            }
        }

        for key in self.labels.keys() {
            if RESERVED_LABELS.contains(&key.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: field("labels"),
                    reason: format!("label '{key}' is reserved"),
                });
            }
            if !is_valid_label_name(key) {
                return Err(ConfigError::InvalidValue {
                    field: field("labels"),
                    reason: format!("label '{key}' is not a valid Prometheus label name"),
                });
            }
        }

        for (i, bound) in self.histogram_buckets.iter().enumerate() {
            if !bound.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: field("histogram_buckets"),
                    reason: format!("bucket {bound} must be finite"),
                });
            }
            if i > 0 && *bound <= self.histogram_buckets[i - 1] {
                return Err(ConfigError::InvalidValue {
                    field: field("histogram_buckets"),
                    reason: "buckets must be strictly increasing".to_owned(),
                });
            }
        }

        if self.log_files.is_empty() {
            warn!(application = name, "application has no log files configured");
        }

        Ok(())
    }
}

/// include/exclude 경로 필터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// 경로 정규식
    pub path: String,
    /// 허용 HTTP 메서드 (비어 있으면 전체)
    #[serde(default)]
    pub methods: Vec<String>,
}

/// 경로 치환 규칙
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceConfig {
    /// 경로 정규식
    pub path: String,
    /// 허용 HTTP 메서드 (비어 있으면 전체)
    #[serde(default)]
    pub methods: Vec<String>,
    /// 치환 문자열 (`{{`를 포함하면 템플릿, 생략하면 빈 문자열)
    #[serde(default)]
    pub with: String,
}

/// Prometheus 레이블 이름 규칙을 확인합니다.
///
/// `[a-zA-Z_][a-zA-Z0-9_]*`, `__` 접두어는 예약됨.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name.starts_with("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn read_config_file(path: &Path) -> Result<String, ExporterError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExporterError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            })
        } else {
            ExporterError::Io(e)
        }
    })?;

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::InvalidValue {
            field: path.display().to_string(),
            reason: format!(
                "file too large: {} bytes (max: {MAX_CONFIG_FILE_SIZE})",
                metadata.len()
            ),
        }
        .into());
    }

    Ok(tokio::fs::read_to_string(path).await?)
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const APP_YAML: &str = r#"
format: '$remote_addr "$request" $status $body_bytes_sent'
labels:
  zone: eu
  env: prod
log_files:
  - /var/log/nginx/access.log
"#;

    #[test]
    fn default_config_has_sane_values() {
        let config = ExporterConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.listen.port, 9900);
        assert_eq!(config.listen.endpoint, "/metrics");
        assert!(config.applications.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        ExporterConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = ExporterConfig::parse("", "test").unwrap();
        assert_eq!(config.listen.port, 9900);
    }

    #[test]
    fn partial_yaml_merges_with_defaults() {
        let yaml = r#"
log_level: DEBUG
listen:
  port: 9113
"#;
        let config = ExporterConfig::parse(yaml, "test").unwrap();
        assert_eq!(config.listen.port, 9113);
        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.tracing_level().unwrap(), "debug");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let yaml = "log_levle: info\n";
        let err = ExporterConfig::parse(yaml, "typo.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
        assert!(err.to_string().contains("typo.yaml"));
    }

    #[test]
    fn warning_alias_maps_to_warn() {
        let config = ExporterConfig {
            log_level: "WARNING".to_owned(),
            ..Default::default()
        };
        assert_eq!(config.tracing_level().unwrap(), "warn");
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let config = ExporterConfig {
            log_level: "verbose".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let config = ExporterConfig {
            log_format: "xml".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("log_format"));
    }

    #[test]
    fn ordered_labels_are_sorted_by_name() {
        let app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        let (names, values) = app.ordered_labels();
        assert_eq!(names, vec!["env", "zone"]);
        assert_eq!(values, vec!["prod", "eu"]);
    }

    #[test]
    fn relative_log_file_is_rejected() {
        let mut app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        app.log_files = vec!["logs/access.log".to_owned()];
        let err = app.validate("web").unwrap_err();
        assert!(err.to_string().contains("not an absolute path"));
    }

    #[test]
    fn reserved_label_is_rejected() {
        let mut app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        app.labels.insert("status".to_owned(), "x".to_owned());
        assert!(app.validate("web").unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn invalid_label_name_is_rejected() {
        let mut app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        app.labels.insert("data-center".to_owned(), "x".to_owned());
        assert!(app.validate("web").is_err());
    }

    #[test]
    fn unsorted_buckets_are_rejected() {
        let mut app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        app.histogram_buckets = vec![0.1, 0.5, 0.2];
        assert!(app.validate("web").is_err());
    }

    #[test]
    fn empty_buckets_fall_back_to_defaults() {
        let app = AppConfig::parse(APP_YAML, "app.yaml").unwrap();
        assert_eq!(app.buckets(), DEFAULT_HISTOGRAM_BUCKETS.to_vec());
    }

    #[test]
    fn replace_rule_without_with_defaults_to_empty() {
        let yaml = r#"
format: '$request'
replace:
  - path: '^/a'
"#;
        let app = AppConfig::parse(yaml, "app.yaml").unwrap();
        assert_eq!(app.replace[0].with, "");
        app.validate("web").unwrap();
    }

    #[test]
    fn empty_rule_pattern_is_accepted() {
        // 빈 정규식은 모든 경로와 일치하므로 메서드 목록만으로 거를 수 있음
        let yaml = r#"
format: '$request'
exclude:
  - path: ''
    methods: [OPTIONS]
"#;
        let app = AppConfig::parse(yaml, "app.yaml").unwrap();
        app.validate("web").unwrap();
    }

    #[test]
    fn label_name_rules() {
        assert!(is_valid_label_name("env"));
        assert!(is_valid_label_name("_private"));
        assert!(is_valid_label_name("zone_2"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("2zone"));
        assert!(!is_valid_label_name("__meta"));
        assert!(!is_valid_label_name("a.b"));
    }

    #[test]
    #[serial]
    fn env_override_listen_port() {
        let mut config = ExporterConfig::default();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("NGXLOG_LISTEN_PORT", "9200") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("NGXLOG_LISTEN_PORT") };
        assert_eq!(config.listen.port, 9200);
    }

    #[test]
    #[serial]
    fn env_override_invalid_port_keeps_original() {
        let mut config = ExporterConfig::default();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("NGXLOG_LISTEN_PORT", "not-a-port") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("NGXLOG_LISTEN_PORT") };
        assert_eq!(config.listen.port, 9900);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = ExporterConfig::from_file("/nonexistent/path/ngxlog.yaml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExporterError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn app_dir_files_become_applications() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shop.yaml"), APP_YAML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut config = ExporterConfig {
            app_dir: Some(dir.path().display().to_string()),
            ..Default::default()
        };
        config.load_app_dir().await.unwrap();

        assert_eq!(config.applications.len(), 1);
        assert!(config.applications.contains_key("shop"));
    }

    #[tokio::test]
    async fn app_dir_duplicate_application_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shop.yaml"), APP_YAML).unwrap();

        let mut config = ExporterConfig {
            app_dir: Some(dir.path().display().to_string()),
            ..Default::default()
        };
        config
            .applications
            .insert("shop".to_owned(), AppConfig::parse(APP_YAML, "inline").unwrap());

        let err = config.load_app_dir().await.unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }
}
