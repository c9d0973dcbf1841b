//! 경로 규칙 엔진 -- exclude/include/replace 분류기
//!
//! 애플리케이션 설정의 세 규칙 목록을 한 번 컴파일하고, 라인마다
//! `(method, path)`를 분류합니다.
//!
//! # 규칙 형식
//! ```yaml
//! exclude:
//!   - path: '^/health'
//! include:
//!   - path: '^/api/'
//!     methods: [GET, POST]
//! replace:
//!   - path: '^/api/users/(?P<id>\d+)$'
//!     with: '/api/users/:id'
//! ```
//!
//! # 평가 순서
//! 1. exclude 중 하나라도 일치하면 제외
//! 2. include가 비어 있지 않은데 아무것도 일치하지 않으면 제외
//! 3. 처음 일치하는 replace 규칙으로 경로 치환
//!
//! 모든 단계에서 선언 순서상 첫 번째 일치가 우선합니다.
//!
//! # 아키텍처
//! - [`RuleSet`]: 세 목록을 보유하고 [`Classification`]을 반환
//! - [`filter`]: 경로 정규식 + 메서드 목록
//! - [`replace`]: 정규식 치환 또는 템플릿 치환
//! - [`template`]: `{{.name}}` 치환 템플릿

pub mod filter;
pub mod replace;
pub mod template;

pub use filter::FilterRule;
pub use replace::ReplaceRule;
pub use template::PathTemplate;

use ngxlog_core::config::{FilterConfig, ReplaceConfig};

use crate::error::LogPipelineError;

/// 라인 제외 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// 해당 인덱스의 exclude 규칙과 일치
    Excluded(usize),
    /// include 규칙 중 일치하는 것이 없음
    NotIncluded,
}

/// 경로 분류 결과
#[derive(Debug)]
pub enum Classification {
    /// 라인을 건너뜀 (메트릭 기록 없음)
    Drop(DropReason),
    /// 최종 경로 레이블로 기록
    Keep(String),
    /// replace 템플릿 렌더링 실패 (라인 건너뜀)
    RenderFailed(LogPipelineError),
}

/// 애플리케이션 하나의 컴파일된 경로 규칙
///
/// 컴파일 후 불변이며 같은 애플리케이션의 모든 모니터가 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    exclude: Vec<FilterRule>,
    include: Vec<FilterRule>,
    replace: Vec<ReplaceRule>,
}

impl RuleSet {
    /// 설정의 규칙 목록을 컴파일합니다.
    ///
    /// 에러의 `field`에는 실패한 규칙의 위치(`include[1].path` 등)가 담깁니다.
    pub fn compile(
        exclude: &[FilterConfig],
        include: &[FilterConfig],
        replace: &[ReplaceConfig],
    ) -> Result<Self, LogPipelineError> {
        let located = |list: &str, idx: usize, err: LogPipelineError| LogPipelineError::Config {
            field: format!("{list}[{idx}]"),
            reason: err.to_string(),
        };

        let exclude = exclude
            .iter()
            .enumerate()
            .map(|(idx, f)| FilterRule::compile(&f.path, &f.methods).map_err(|e| located("exclude", idx, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let include = include
            .iter()
            .enumerate()
            .map(|(idx, f)| FilterRule::compile(&f.path, &f.methods).map_err(|e| located("include", idx, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let replace = replace
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                ReplaceRule::compile(&r.path, &r.methods, &r.with).map_err(|e| located("replace", idx, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude,
            include,
            replace,
        })
    }

    /// 메서드와 경로를 분류합니다.
    pub fn classify(&self, method: &str, path: &str) -> Classification {
        if let Some(idx) = self.exclude.iter().position(|r| r.matches(method, path)) {
            return Classification::Drop(DropReason::Excluded(idx));
        }

        if !self.include.is_empty() && !self.include.iter().any(|r| r.matches(method, path)) {
            return Classification::Drop(DropReason::NotIncluded);
        }

        match self.replace.iter().find(|r| r.matches(method, path)) {
            Some(rule) => match rule.apply(path) {
                Ok(rewritten) => Classification::Keep(rewritten),
                Err(e) => Classification::RenderFailed(e),
            },
            None => Classification::Keep(path.to_owned()),
        }
    }

    /// 규칙 수 (exclude, include, replace)
    pub fn len(&self) -> (usize, usize, usize) {
        (self.exclude.len(), self.include.len(), self.replace.len())
    }

    /// 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.include.is_empty() && self.replace.is_empty()
    }
}
