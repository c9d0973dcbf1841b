//! 경로 치환 규칙
//!
//! 두 가지 모드가 컴파일 시 한 번 결정됩니다.
//! - 정규식 치환: `with`를 `regex` 치환 문자열로 사용 (`$1`, `${name}`)
//! - 템플릿: `with`에 `{{`가 있으면 [`PathTemplate`]으로 컴파일하고
//!   경로 정규식의 이름 있는 그룹을 바인딩

use std::collections::BTreeMap;

use super::filter::FilterRule;
use super::template::{PathTemplate, is_template};
use crate::error::LogPipelineError;

/// 치환 방식
#[derive(Debug, Clone)]
enum Rewrite {
    /// 정규식 치환 문자열
    Substitute(String),
    /// 이름 있는 그룹 템플릿
    Template(PathTemplate),
}

/// 컴파일된 경로 치환 규칙
#[derive(Debug, Clone)]
pub struct ReplaceRule {
    filter: FilterRule,
    rewrite: Rewrite,
}

impl ReplaceRule {
    /// 경로 패턴, 메서드 목록, 치환 값으로 규칙을 컴파일합니다.
    ///
    /// 템플릿이 참조하는 그룹이 패턴에 있는지는 검사하지 않습니다.
    /// 없는 그룹은 [`apply`](Self::apply) 시점에 렌더링 에러가 됩니다.
    pub fn compile(path: &str, methods: &[String], with: &str) -> Result<Self, LogPipelineError> {
        let filter = FilterRule::compile(path, methods)?;
        let rewrite = if is_template(with) {
            Rewrite::Template(PathTemplate::compile(with)?)
        } else {
            Rewrite::Substitute(with.to_owned())
        };
        Ok(Self { filter, rewrite })
    }

    /// 메서드와 경로가 이 규칙의 대상인지 확인합니다.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.filter.matches(method, path)
    }

    /// 경로에 치환을 적용합니다.
    pub fn apply(&self, path: &str) -> Result<String, LogPipelineError> {
        let regex = self.filter.regex();
        match &self.rewrite {
            Rewrite::Substitute(with) => Ok(regex.replace_all(path, with.as_str()).into_owned()),
            Rewrite::Template(template) => {
                let captures = regex.captures(path);
                let bindings: BTreeMap<&str, &str> = regex
                    .capture_names()
                    .flatten()
                    .map(|name| {
                        let value = captures
                            .as_ref()
                            .and_then(|c| c.name(name))
                            .map_or("", |m| m.as_str());
                        (name, value)
                    })
                    .collect();
                template.render(&bindings)
            }
        }
    }

    /// 템플릿 모드 여부
    pub fn is_template(&self) -> bool {
        matches!(self.rewrite, Rewrite::Template(_))
    }
}
