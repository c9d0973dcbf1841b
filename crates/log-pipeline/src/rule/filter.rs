//! 경로 필터 규칙 -- exclude/include 목록의 단위

use regex::Regex;

use crate::error::LogPipelineError;

/// 컴파일된 경로 필터
///
/// 경로 정규식은 부분 일치로 평가됩니다. 전체 경로 일치가 필요하면
/// 패턴에 `^`/`$`를 직접 넣어야 합니다.
#[derive(Debug, Clone)]
pub struct FilterRule {
    /// 경로 정규식
    path: Regex,
    /// 허용 메서드 목록 (비어 있으면 모든 메서드)
    methods: Vec<String>,
}

impl FilterRule {
    /// 경로 패턴과 메서드 목록으로 규칙을 컴파일합니다.
    pub fn compile(path: &str, methods: &[String]) -> Result<Self, LogPipelineError> {
        let path = Regex::new(path).map_err(|e| LogPipelineError::RuleCompile {
            pattern: path.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path,
            methods: methods.to_vec(),
        })
    }

    /// 경로가 패턴과 일치하고 메서드가 허용 목록에 있으면 `true`.
    ///
    /// 메서드 비교는 대소문자를 구분합니다.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.path.is_match(path) && (self.methods.is_empty() || self.methods.iter().any(|m| m == method))
    }

    /// 컴파일된 경로 정규식을 반환합니다.
    pub fn regex(&self) -> &Regex {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_methods_match_any_method() {
        let rule = FilterRule::compile("^/api/", &[]).unwrap();
        assert!(rule.matches("GET", "/api/users"));
        assert!(rule.matches("DELETE", "/api/users"));
        assert!(!rule.matches("GET", "/static/app.js"));
    }

    #[test]
    fn method_list_restricts_matches() {
        let rule = FilterRule::compile("^/api/", &["GET".to_owned(), "POST".to_owned()]).unwrap();
        assert!(rule.matches("POST", "/api/users"));
        assert!(!rule.matches("PUT", "/api/users"));
    }

    #[test]
    fn method_comparison_is_case_sensitive() {
        let rule = FilterRule::compile("/", &["GET".to_owned()]).unwrap();
        assert!(!rule.matches("get", "/"));
    }

    #[test]
    fn unanchored_pattern_matches_substring() {
        let rule = FilterRule::compile("health", &[]).unwrap();
        assert!(rule.matches("GET", "/internal/healthz"));
    }

    #[test]
    fn invalid_regex_fails_compile() {
        let err = FilterRule::compile("([a-z", &[]).unwrap_err();
        assert!(matches!(err, LogPipelineError::RuleCompile { .. }));
        assert!(err.to_string().contains("([a-z"));
    }
}
