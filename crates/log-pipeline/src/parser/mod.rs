//! 액세스 로그 파싱 모듈 -- `log_format` 문법, 요청 라인 분해
//!
//! [`AccessLogGrammar`]는 애플리케이션의 `format` 설정을 한 번 컴파일하고,
//! 라인마다 [`FieldMap`]을 돌려줍니다. 요청 라인과 업스트림 시간 필드는
//! [`decompose_request`], [`parse_upstream_time`]으로 해석합니다.
//!
//! # 사용 예시
//! ```
//! use ngxlog_log_pipeline::parser::{AccessLogGrammar, decompose_request};
//!
//! let grammar = AccessLogGrammar::compile(r#""$request" $status"#).unwrap();
//! let fields = grammar.parse(r#""GET /users/42?full=1 HTTP/1.1" 200"#).unwrap();
//! let (method, path) = decompose_request(fields.field("request").unwrap()).unwrap();
//! assert_eq!(method, "GET");
//! assert_eq!(path, "/users/42");
//! ```

pub mod access;
pub mod request;

pub use access::{AccessLogGrammar, FieldMap};
pub use request::{decompose_request, parse_upstream_time};
