//! nginx `log_format` 문법 파서
//!
//! `log_format` 문자열을 정규식으로 한 번 컴파일하고, 로그 라인을
//! 이름 있는 필드로 분해합니다.
//!
//! # 문법 규칙
//! - `$name` 또는 `${name}`은 필드, 나머지는 그대로 일치해야 하는 리터럴
//! - 필드는 뒤따르는 리터럴의 첫 글자가 나오기 전까지를 캡처 (`[^d]*`)
//! - 포맷 끝의 필드는 다음 공백 전까지를 캡처
//! - 리터럴 없이 붙어 있는 두 필드는 앞 필드가 최소 매칭 (`.*?`)
//! - 라인 시작에만 앵커링되며, 뒤에 남는 데이터는 무시
//!
//! # 사용 예시
//! ```
//! use ngxlog_log_pipeline::parser::AccessLogGrammar;
//!
//! let grammar = AccessLogGrammar::compile(r#"$remote_addr [$time_local] "$request" $status"#).unwrap();
//! let fields = grammar
//!     .parse(r#"10.0.0.1 [15/Jan/2024:12:00:00 +0000] "GET /a HTTP/1.1" 200"#)
//!     .unwrap();
//! assert_eq!(fields.field("request"), Some("GET /a HTTP/1.1"));
//! assert_eq!(fields.field("status"), Some("200"));
//! ```

use std::collections::HashSet;

use regex::{Captures, Regex};

use crate::error::LogPipelineError;

/// 포맷 문자열 구성 요소
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// 그대로 일치해야 하는 텍스트
    Literal(String),
    /// 필드 이름
    Field(String),
}

/// 컴파일된 액세스 로그 문법
///
/// 내부 정규식은 불변이며 스레드 간 공유가 안전합니다.
#[derive(Debug, Clone)]
pub struct AccessLogGrammar {
    /// 원본 포맷 문자열
    format: String,
    /// 컴파일된 정규식
    regex: Regex,
    /// 선언 순서대로의 필드 이름
    fields: Vec<String>,
}

impl AccessLogGrammar {
    /// `log_format` 문자열을 컴파일합니다.
    pub fn compile(format: &str) -> Result<Self, LogPipelineError> {
        let segments = tokenize(format)?;

        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut pattern = String::from("^");

        for (idx, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Field(name) => {
                    if !seen.insert(name.clone()) {
                        return Err(LogPipelineError::Grammar {
                            format: format.to_owned(),
                            reason: format!("field '${name}' appears more than once"),
                        });
                    }
                    let capture = match segments.get(idx + 1) {
                        Some(Segment::Literal(next)) => {
                            // tokenize는 빈 리터럴을 만들지 않음
                            let delim = next.chars().next().unwrap_or(' ');
                            format!("[^{}]*", regex::escape(&delim.to_string()))
                        }
                        Some(Segment::Field(_)) => ".*?".to_owned(),
                        None => "[^ ]*".to_owned(),
                    };
                    pattern.push_str(&format!("(?P<{name}>{capture})"));
                    fields.push(name.clone());
                }
            }
        }

        let regex = Regex::new(&pattern).map_err(|e| LogPipelineError::Grammar {
            format: format.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            format: format.to_owned(),
            regex,
            fields,
        })
    }

    /// 로그 라인을 필드로 분해합니다.
    ///
    /// 라인이 포맷과 일치하지 않으면 [`LogPipelineError::Parse`]를 반환합니다.
    pub fn parse<'l>(&self, line: &'l str) -> Result<FieldMap<'l>, LogPipelineError> {
        self.regex
            .captures(line)
            .map(|captures| FieldMap { captures })
            .ok_or_else(|| LogPipelineError::Parse {
                line: line.to_owned(),
                format: self.format.clone(),
            })
    }

    /// 선언 순서대로의 필드 이름을 반환합니다.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// 한 라인에서 추출한 필드 값
///
/// 원본 라인을 빌려 쓰므로 라인당 할당이 없습니다.
#[derive(Debug)]
pub struct FieldMap<'l> {
    captures: Captures<'l>,
}

impl<'l> FieldMap<'l> {
    /// 필드의 원시 문자열 값을 반환합니다. 포맷에 없는 필드는 `None`.
    pub fn field(&self, name: &str) -> Option<&'l str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// 필드를 실수로 파싱합니다. 필드가 없거나 숫자가 아니면 `None`.
    pub fn float_field(&self, name: &str) -> Option<f64> {
        self.field(name)?.parse::<f64>().ok()
    }
}

/// 포맷 문자열을 리터럴/필드 세그먼트로 나눕니다.
fn tokenize(format: &str) -> Result<Vec<Segment>, LogPipelineError> {
    let grammar_err = |reason: String| LogPipelineError::Grammar {
        format: format.to_owned(),
        reason,
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = format.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if ch != '$' {
            literal.push(ch);
            continue;
        }

        let mut name = String::new();
        if chars.peek().is_some_and(|&(_, c)| c == '{') {
            chars.next();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed {
                return Err(grammar_err(format!("unclosed '${{' at offset {pos}")));
            }
        } else {
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                name.push(c);
                chars.next();
            }
        }

        if name.is_empty() {
            // 이름 없는 `$`는 리터럴로 취급
            literal.push('$');
            continue;
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || name.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(grammar_err(format!("invalid field name '{name}'")));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Field(name));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    if !segments.iter().any(|s| matches!(s, Segment::Field(_))) {
        return Err(grammar_err("format declares no fields".to_owned()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBINED: &str = r#"$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent""#;

    const COMBINED_LINE: &str = r#"203.0.113.7 - - [15/Jan/2024:12:00:00 +0000] "GET /api/users?page=2 HTTP/1.1" 200 512 "-" "curl/8.4.0""#;

    #[test]
    fn tokenize_splits_fields_and_literals() {
        let segments = tokenize("$a [$b]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Field("a".to_owned()),
                Segment::Literal(" [".to_owned()),
                Segment::Field("b".to_owned()),
                Segment::Literal("]".to_owned()),
            ]
        );
    }

    #[test]
    fn combined_format_extracts_all_fields() {
        let grammar = AccessLogGrammar::compile(COMBINED).unwrap();
        let fields = grammar.parse(COMBINED_LINE).unwrap();

        assert_eq!(fields.field("remote_addr"), Some("203.0.113.7"));
        assert_eq!(fields.field("remote_user"), Some("-"));
        assert_eq!(fields.field("time_local"), Some("15/Jan/2024:12:00:00 +0000"));
        assert_eq!(fields.field("request"), Some("GET /api/users?page=2 HTTP/1.1"));
        assert_eq!(fields.field("status"), Some("200"));
        assert_eq!(fields.float_field("body_bytes_sent"), Some(512.0));
        assert_eq!(fields.field("http_user_agent"), Some("curl/8.4.0"));
    }

    #[test]
    fn fields_are_listed_in_declaration_order() {
        let grammar = AccessLogGrammar::compile(COMBINED).unwrap();
        assert_eq!(grammar.fields()[0], "remote_addr");
        assert_eq!(grammar.fields().len(), 8);
        assert!(grammar.fields().iter().any(|f| f == "request"));
        assert!(!grammar.fields().iter().any(|f| f == "request_time"));
    }

    #[test]
    fn missing_field_returns_none() {
        let grammar = AccessLogGrammar::compile("$status").unwrap();
        let fields = grammar.parse("200").unwrap();
        assert_eq!(fields.field("request_time"), None);
        assert_eq!(fields.float_field("request_time"), None);
    }

    #[test]
    fn non_numeric_float_field_returns_none() {
        let grammar = AccessLogGrammar::compile("$status $request_time").unwrap();
        let fields = grammar.parse("200 -").unwrap();
        assert_eq!(fields.field("request_time"), Some("-"));
        assert_eq!(fields.float_field("request_time"), None);
    }

    #[test]
    fn trailing_field_stops_at_space() {
        let grammar = AccessLogGrammar::compile("$status $request_time").unwrap();
        let fields = grammar.parse("200 0.125 trailing junk").unwrap();
        assert_eq!(fields.float_field("request_time"), Some(0.125));
    }

    #[test]
    fn braced_variables_are_supported() {
        let grammar = AccessLogGrammar::compile("${status}:${request_time}").unwrap();
        let fields = grammar.parse("404:0.5").unwrap();
        assert_eq!(fields.field("status"), Some("404"));
        assert_eq!(fields.field("request_time"), Some("0.5"));
    }

    #[test]
    fn adjacent_fields_split_lazily() {
        let grammar = AccessLogGrammar::compile("$a$b;").unwrap();
        let fields = grammar.parse("xy;").unwrap();
        assert_eq!(fields.field("a"), Some(""));
        assert_eq!(fields.field("b"), Some("xy"));
    }

    #[test]
    fn mismatched_line_is_an_error() {
        let grammar = AccessLogGrammar::compile(COMBINED).unwrap();
        let err = grammar.parse("not an access log line").unwrap_err();
        assert!(matches!(err, LogPipelineError::Parse { .. }));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = AccessLogGrammar::compile("$status $status").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn format_without_fields_is_rejected() {
        assert!(AccessLogGrammar::compile("just text").is_err());
    }

    #[test]
    fn unclosed_brace_is_rejected() {
        assert!(AccessLogGrammar::compile("${status").is_err());
    }

    #[test]
    fn digit_leading_field_name_is_rejected() {
        assert!(AccessLogGrammar::compile("$1abc").is_err());
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let grammar = AccessLogGrammar::compile("($status) *$request_time*").unwrap();
        let fields = grammar.parse("(200) *0.01*").unwrap();
        assert_eq!(fields.field("status"), Some("200"));
        assert_eq!(fields.field("request_time"), Some("0.01"));
    }
}
