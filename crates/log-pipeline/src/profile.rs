//! 컴파일된 애플리케이션 프로파일
//!
//! 설정([`AppConfig`])을 시작 시점에 한 번 컴파일한 결과입니다.
//! 포맷 문법, 경로 규칙, 히스토그램 세트를 묶어 같은 애플리케이션의
//! 모든 파일 모니터가 `Arc`로 공유합니다.

use std::path::PathBuf;

use ngxlog_core::config::AppConfig;

use crate::error::LogPipelineError;
use crate::parser::AccessLogGrammar;
use crate::recorder::MetricSet;
use crate::rule::RuleSet;

/// 애플리케이션 하나의 컴파일된 설정
#[derive(Debug, Clone)]
pub struct ApplicationProfile {
    /// 애플리케이션 이름
    pub name: String,
    /// 포맷 문법
    pub grammar: AccessLogGrammar,
    /// 경로 규칙
    pub rules: RuleSet,
    /// 히스토그램 세트
    pub metrics: MetricSet,
    /// 감시할 로그 파일 (절대 경로)
    pub log_files: Vec<PathBuf>,
    /// 파일 처음부터 읽을지 여부
    pub from_beginning: bool,
    /// 히스토그램 버킷 경계
    pub histogram_buckets: Vec<f64>,
}

impl ApplicationProfile {
    /// 애플리케이션 설정을 컴파일합니다.
    ///
    /// 설정 검증(`AppConfig::validate`)을 다시 수행한 뒤 포맷과 규칙을
    /// 컴파일합니다. 에러의 `field`는 `applications.<name>...` 형태입니다.
    pub fn compile(name: &str, config: &AppConfig) -> Result<Self, LogPipelineError> {
        config.validate(name).map_err(|e| LogPipelineError::Config {
            field: format!("applications.{name}"),
            reason: e.to_string(),
        })?;

        let grammar = AccessLogGrammar::compile(&config.format).map_err(|e| LogPipelineError::Config {
            field: format!("applications.{name}.format"),
            reason: e.to_string(),
        })?;

        let rules = RuleSet::compile(&config.exclude, &config.include, &config.replace).map_err(
            |e| match e {
                LogPipelineError::Config { field, reason } => LogPipelineError::Config {
                    field: format!("applications.{name}.{field}"),
                    reason,
                },
                other => other,
            },
        )?;

        if rules.is_empty() {
            tracing::debug!(application = name, "no path rules, every request is kept");
        } else {
            let (exclude, include, replace) = rules.len();
            tracing::debug!(application = name, exclude, include, replace, "compiled path rules");
        }

        let (label_names, label_values) = config.ordered_labels();
        let metrics = MetricSet::new(name, &label_names, &label_values, grammar.fields());

        if metrics.enabled_signals().is_empty() {
            tracing::warn!(
                application = name,
                format = %config.format,
                "format has no histogram fields; only line counters will be recorded"
            );
        }

        Ok(Self {
            name: name.to_owned(),
            grammar,
            rules,
            metrics,
            log_files: config.log_files.iter().map(PathBuf::from).collect(),
            from_beginning: config.from_beginning,
            histogram_buckets: config.buckets(),
        })
    }
}
