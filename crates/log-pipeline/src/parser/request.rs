//! 요청 라인 및 업스트림 시간 필드 분해

use percent_encoding::percent_decode_str;

use crate::error::LogPipelineError;

/// `$request` 필드를 메서드와 경로로 분해합니다.
///
/// 단일 공백으로 나눈 첫 토큰이 메서드, 두 번째 토큰이 경로입니다.
/// 경로는 퍼센트 디코딩된 뒤 첫 번째 `?`부터 잘립니다.
///
/// # 에러
/// - 토큰이 2개 미만이면 [`LogPipelineError::MalformedRequest`]
/// - 잘못된 이스케이프나 UTF-8이 아닌 디코딩 결과는 [`LogPipelineError::PathDecode`]
pub fn decompose_request(request: &str) -> Result<(&str, String), LogPipelineError> {
    let mut tokens = request.split(' ');
    let method = tokens.next().unwrap_or_default();
    let raw_path = tokens
        .next()
        .ok_or_else(|| LogPipelineError::MalformedRequest(request.to_owned()))?;

    let mut path = unescape_path(raw_path)?;
    if let Some(idx) = path.find('?') {
        path.truncate(idx);
    }

    Ok((method, path))
}

/// 업스트림 시간 필드(`$upstream_response_time` 등)를 초 단위 합계로 변환합니다.
///
/// nginx는 여러 업스트림을 거친 경우 `", "`로 구분된 값을 기록합니다.
/// 하나라도 숫자가 아니면 전체가 실패합니다.
pub fn parse_upstream_time(field: &str, value: &str) -> Result<f64, LogPipelineError> {
    value.split(", ").try_fold(0.0, |sum, token| {
        token
            .parse::<f64>()
            .map(|v| sum + v)
            .map_err(|_| LogPipelineError::InvalidNumber {
                field: field.to_owned(),
                value: value.to_owned(),
            })
    })
}

/// 엄격한 퍼센트 디코딩: 모든 `%` 뒤에는 16진수 두 자리가 와야 합니다.
fn unescape_path(raw: &str) -> Result<String, LogPipelineError> {
    let bytes = raw.as_bytes();
    let mut start = 0;
    while let Some(pos) = bytes[start..].iter().position(|&b| b == b'%') {
        let at = start + pos;
        let valid = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            let end = (at + 3).min(bytes.len());
            return Err(LogPipelineError::PathDecode {
                path: raw.to_owned(),
                reason: format!(
                    "invalid URL escape \"{}\"",
                    String::from_utf8_lossy(&bytes[at..end])
                ),
            });
        }
        start = at + 3;
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| LogPipelineError::PathDecode {
            path: raw.to_owned(),
            reason: e.to_string(),
        })
}
