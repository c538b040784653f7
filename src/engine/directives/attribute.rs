use super::Resolution;
use crate::engine::state::CollectedValue;
use crate::error::DirectiveError;
use crate::script::AttributeKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// 생년월일 입력 자릿수.
const BIRTH_DATE_LEN: usize = 6;

/// YYMMDD 형식에서 정규화된 생년월일이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate {
    /// 두 자리 연도.
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

impl BirthDate {
    /// `YY년 MM월 DD일` 형태로 표시한다.
    pub fn display(&self) -> String {
        format!("{:02}년 {:02}월 {:02}일", self.year, self.month, self.day)
    }
}

/// 6자리 숫자 문자열을 생년월일로 파싱한다.
///
/// 자릿수, 문자 종류, 월/일 범위 순서로 검사한다.
pub fn parse_birth_date(raw: &str) -> Result<BirthDate, DirectiveError> {
    static DIGITS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[0-9]+$").expect("정규식 컴파일 실패"));
    let value = raw.trim();
    let length = value.chars().count();
    if length != BIRTH_DATE_LEN {
        return Err(DirectiveError::WrongLength {
            expected: BIRTH_DATE_LEN,
            actual: length,
        });
    }
    if !DIGITS.is_match(value) {
        return Err(DirectiveError::NonNumeric(value.to_string()));
    }
    let part = |range: std::ops::Range<usize>| -> Result<u8, DirectiveError> {
        value[range]
            .parse::<u8>()
            .map_err(|_| DirectiveError::NonNumeric(value.to_string()))
    };
    let date = BirthDate {
        year: part(0..2)?,
        month: part(2..4)?,
        day: part(4..6)?,
    };
    if !(1..=12).contains(&date.month) || !(1..=31).contains(&date.day) {
        return Err(DirectiveError::InvalidDate(value.to_string()));
    }
    Ok(date)
}

/// 속성 종류별 정규화/검증을 수행한다.
pub(super) fn resolve_attribute(
    kind: AttributeKind,
    raw: &str,
) -> Result<Resolution, DirectiveError> {
    match kind {
        AttributeKind::DateOfBirth => {
            let date = parse_birth_date(raw)?;
            Ok(Resolution {
                value: CollectedValue::Attribute(raw.trim().to_string()),
                display: date.display(),
            })
        }
        AttributeKind::Gender => {
            let (code, display) = match raw.trim().to_lowercase().as_str() {
                "male" | "m" | "남" | "남성" | "남자" => ("male", "남성"),
                "female" | "f" | "여" | "여성" | "여자" => ("female", "여성"),
                _ => return Err(unknown_category(kind, raw)),
            };
            Ok(categorical(code, display))
        }
        AttributeKind::BloodType => {
            let normalized = raw.trim().to_uppercase();
            let code = normalized.strip_suffix('형').unwrap_or(&normalized).trim();
            match code {
                "A" | "B" | "O" | "AB" => Ok(categorical(code, &format!("{code}형"))),
                _ => Err(unknown_category(kind, raw)),
            }
        }
    }
}

fn categorical(code: &str, display: &str) -> Resolution {
    Resolution {
        value: CollectedValue::Attribute(code.to_string()),
        display: display.to_string(),
    }
}

fn unknown_category(kind: AttributeKind, raw: &str) -> DirectiveError {
    DirectiveError::UnknownCategory {
        attribute: kind.label().to_string(),
        value: raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_date_accepts_six_digits_and_formats_korean() {
        let resolved =
            resolve_attribute(AttributeKind::DateOfBirth, "951225").expect("유효한 생년월일");
        assert_eq!(resolved.display, "95년 12월 25일");
        assert_eq!(resolved.value, CollectedValue::Attribute("951225".into()));
    }

    #[test]
    fn birth_date_rejects_wrong_length_and_non_numeric() {
        assert_eq!(
            parse_birth_date("95122"),
            Err(DirectiveError::WrongLength {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(
            parse_birth_date("95122x"),
            Err(DirectiveError::NonNumeric("95122x".into()))
        );
        assert!(matches!(
            parse_birth_date("9512250"),
            Err(DirectiveError::WrongLength { actual: 7, .. })
        ));
    }

    #[test]
    fn birth_date_rejects_impossible_month_or_day() {
        assert!(matches!(
            parse_birth_date("951325"),
            Err(DirectiveError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_birth_date("951200"),
            Err(DirectiveError::InvalidDate(_))
        ));
    }

    #[test]
    fn birth_date_keeps_leading_zeros() {
        let date = parse_birth_date("010203").expect("유효한 생년월일");
        assert_eq!(date.display(), "01년 02월 03일");
    }

    #[test]
    fn gender_and_blood_type_normalize_to_codes() {
        let gender = resolve_attribute(AttributeKind::Gender, " 여성 ").expect("성별");
        assert_eq!(gender.value, CollectedValue::Attribute("female".into()));
        assert_eq!(gender.display, "여성");

        let blood = resolve_attribute(AttributeKind::BloodType, "ab형").expect("혈액형");
        assert_eq!(blood.value, CollectedValue::Attribute("AB".into()));
        assert_eq!(blood.display, "AB형");

        assert!(matches!(
            resolve_attribute(AttributeKind::BloodType, "C"),
            Err(DirectiveError::UnknownCategory { .. })
        ));
    }
}
