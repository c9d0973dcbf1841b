//! 경로 치환 템플릿
//!
//! replace 규칙의 `with` 값에 `{{`가 포함되면 템플릿으로 컴파일됩니다.
//! 지원하는 액션은 경로 정규식의 이름 있는 그룹을 참조하는 `{{.name}}`과
//! 주석 `{{/* ... */}}`뿐이며, 나머지 액션은 컴파일 에러입니다.
//! 두 액션 모두 `{{- ... -}}` 공백 제거 표시를 쓸 수 있습니다.
//!
//! ```
//! use std::collections::BTreeMap;
//! use ngxlog_log_pipeline::rule::PathTemplate;
//!
//! let template = PathTemplate::compile("/users/{{ .id }}/posts").unwrap();
//! let bindings = BTreeMap::from([("id", ":id")]);
//! assert_eq!(template.render(&bindings).unwrap(), "/users/:id/posts");
//! ```

use std::collections::BTreeMap;

use crate::error::LogPipelineError;

/// 템플릿 여는 구분자
pub const OPEN_DELIM: &str = "{{";

/// 템플릿 닫는 구분자
const CLOSE_DELIM: &str = "}}";

/// 템플릿 구성 요소
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// 그대로 출력되는 텍스트
    Text(String),
    /// 바인딩 이름 참조
    Field(String),
}

/// 컴파일된 치환 템플릿
#[derive(Debug, Clone)]
pub struct PathTemplate {
    /// 원문
    source: String,
    /// 파싱된 구성 요소
    parts: Vec<Part>,
}

impl PathTemplate {
    /// 템플릿 원문을 컴파일합니다.
    pub fn compile(source: &str) -> Result<Self, LogPipelineError> {
        let compile_err = |reason: String| LogPipelineError::TemplateCompile {
            template: source.to_owned(),
            reason,
        };

        let mut parts = Vec::new();
        let mut rest = source;
        let mut trim_next = false;

        while let Some(open) = rest.find(OPEN_DELIM) {
            let after_open = &rest[open + OPEN_DELIM.len()..];
            let close = after_open
                .find(CLOSE_DELIM)
                .ok_or_else(|| compile_err("unclosed action".to_owned()))?;
            let (action, trim_before, trim_after) = strip_trim_markers(&after_open[..close]);

            let mut text = &rest[..open];
            if trim_next {
                text = text.trim_start();
            }
            if trim_before {
                text = text.trim_end();
            }
            if !text.is_empty() {
                parts.push(Part::Text(text.to_owned()));
            }
            trim_next = trim_after;

            if action.starts_with("/*") && action.ends_with("*/") && action.len() >= 4 {
                // 주석
            } else if let Some(name) = action.strip_prefix('.').filter(|n| is_identifier(n)) {
                parts.push(Part::Field(name.to_owned()));
            } else {
                return Err(compile_err(format!("unsupported action '{{{{{action}}}}}'")));
            }

            rest = &after_open[close + CLOSE_DELIM.len()..];
        }

        if trim_next {
            rest = rest.trim_start();
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_owned()));
        }

        Ok(Self {
            source: source.to_owned(),
            parts,
        })
    }

    /// 바인딩으로 템플릿을 렌더링합니다.
    ///
    /// 바인딩에 없는 이름을 참조하면 [`LogPipelineError::TemplateRender`].
    pub fn render(&self, bindings: &BTreeMap<&str, &str>) -> Result<String, LogPipelineError> {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Field(name) => {
                    let value = bindings.get(name.as_str()).ok_or_else(|| {
                        LogPipelineError::TemplateRender {
                            template: self.source.clone(),
                            reason: format!("no capture group named '{name}'"),
                        }
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// `with` 값이 템플릿 문법을 사용하는지 판별합니다.
pub fn is_template(with: &str) -> bool {
    with.contains(OPEN_DELIM)
}

/// `{{- ` / ` -}}` 공백 제거 표시를 떼어 내고 (액션, 앞 제거, 뒤 제거)를 반환합니다.
///
/// `-` 뒤(또는 앞)에 공백이 있어야 표시로 인정됩니다.
fn strip_trim_markers(raw: &str) -> (&str, bool, bool) {
    let mut action = raw;
    let trim_before = action
        .strip_prefix('-')
        .is_some_and(|r| r.starts_with(char::is_whitespace));
    if trim_before {
        action = &action[1..];
    }
    let trim_after = action
        .strip_suffix('-')
        .is_some_and(|r| r.ends_with(char::is_whitespace));
    if trim_after {
        action = &action[..action.len() - 1];
    }
    (action.trim(), trim_before, trim_after)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
