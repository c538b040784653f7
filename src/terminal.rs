use fortune_intake::engine::{DirectiveInput, EngineEvent, UiEvent};
use fortune_intake::pool::OptionPool;
use fortune_intake::script::{Directive, Sender};

/// 터미널 한 줄 입력을 UI 이벤트로 바꾼다.
///
/// 빈 줄은 advance, 그 밖의 입력은 대기 중인 지시어 값으로 해석한다.
/// 선택 지시어는 1부터 시작하는 번호를 공백이나 쉼표로 구분해 받는다.
pub(crate) fn line_to_event(line: &str, pending: Option<&Directive>) -> Result<UiEvent, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(UiEvent::Advanced);
    }
    let Some(directive) = pending else {
        return Err("지금은 입력을 받지 않습니다. Enter로 넘겨 주세요.".into());
    };
    let value = match directive {
        Directive::CaptureAttribute { .. } => DirectiveInput::Text(line.to_string()),
        Directive::CaptureSelection { .. } => DirectiveInput::Choices(parse_choices(line)?),
    };
    Ok(UiEvent::Supplied {
        key: directive.key().to_string(),
        value,
    })
}

fn parse_choices(line: &str) -> Result<Vec<usize>, String> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("카드 번호를 숫자로 입력해 주세요: {token}")),
        })
        .collect()
}

/// 엔진 이벤트를 화면에 출력할 문자열로 바꾼다. 출력할 것이 없으면 `None`.
pub(crate) fn render_event(event: &EngineEvent, pool: &OptionPool) -> Option<String> {
    match event {
        EngineEvent::Revealing { .. } => Some("  ...".into()),
        EngineEvent::MessageAppended { entry } => Some(match entry.sender {
            Sender::Bot => format!("🔮 {}", entry.text),
            Sender::User => format!("🙂 {}", entry.text),
        }),
        EngineEvent::AwaitingClick { .. } => Some("   (Enter를 눌러 계속)".into()),
        EngineEvent::AwaitingDirective { directive, .. } => Some(match directive {
            Directive::CaptureAttribute { attribute } => {
                format!("   [{}] 값을 입력해 주세요.", attribute.label())
            }
            Directive::CaptureSelection { cardinality, .. } => {
                let deck = pool
                    .items()
                    .iter()
                    .map(|item| format!("{:>2}. {}", item.index + 1, item.label))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{deck}\n   번호 {cardinality}개를 입력해 주세요. (예: 1 5 12)")
            }
        }),
        EngineEvent::Rejected { reason } => Some(format!("⚠️  {reason}")),
        EngineEvent::Completed { .. } => Some("✅ 대화가 끝났습니다.".into()),
        EngineEvent::Cancelled => Some("대화가 종료되었습니다.".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_intake::script::AttributeKind;

    #[test]
    fn empty_line_advances() {
        assert_eq!(line_to_event("   ", None), Ok(UiEvent::Advanced));
    }

    #[test]
    fn attribute_line_becomes_text_input() {
        let pending = Directive::CaptureAttribute {
            attribute: AttributeKind::DateOfBirth,
        };
        assert_eq!(
            line_to_event("951225", Some(&pending)),
            Ok(UiEvent::Supplied {
                key: "date-of-birth".into(),
                value: DirectiveInput::Text("951225".into()),
            })
        );
    }

    #[test]
    fn selection_line_is_one_based() {
        let pending = Directive::CaptureSelection {
            cardinality: 3,
            key: "selection".into(),
        };
        assert_eq!(
            line_to_event("1, 5 22", Some(&pending)),
            Ok(UiEvent::Supplied {
                key: "selection".into(),
                value: DirectiveInput::Choices(vec![0, 4, 21]),
            })
        );
        assert!(line_to_event("0 1 2", Some(&pending)).is_err());
        assert!(line_to_event("a b c", Some(&pending)).is_err());
    }

    #[test]
    fn text_without_pending_directive_is_refused() {
        assert!(line_to_event("hello", None).is_err());
    }
}
