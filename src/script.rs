use crate::error::ScriptError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 메시지 발신자를 표현한다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// 스크립트가 말하는 봇 메시지.
    #[default]
    Bot,
    /// 지시어 응답으로 합성되는 사용자 메시지.
    User,
}

/// 입력받을 속성의 종류이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeKind {
    /// 6자리 생년월일(YYMMDD).
    DateOfBirth,
    /// 성별.
    Gender,
    /// 혈액형.
    BloodType,
}

impl AttributeKind {
    /// Collected State에 저장될 키를 반환한다.
    pub fn key(&self) -> &'static str {
        match self {
            AttributeKind::DateOfBirth => "date-of-birth",
            AttributeKind::Gender => "gender",
            AttributeKind::BloodType => "blood-type",
        }
    }

    /// 사용자에게 보여줄 항목 이름이다.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::DateOfBirth => "생년월일",
            AttributeKind::Gender => "성별",
            AttributeKind::BloodType => "혈액형",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Step에 붙는 입력 대기 지시어이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Directive {
    /// 단일 속성 값을 입력받는다.
    CaptureAttribute {
        /// 입력받을 속성 종류.
        attribute: AttributeKind,
    },
    /// 옵션 풀에서 정해진 개수만큼 고르게 한다.
    CaptureSelection {
        /// 정확히 골라야 하는 개수.
        cardinality: usize,
        /// Collected State에 저장될 키.
        #[serde(default = "default_selection_key")]
        key: String,
    },
}

impl Directive {
    /// 이 지시어의 결과가 저장될 키를 반환한다.
    pub fn key(&self) -> &str {
        match self {
            Directive::CaptureAttribute { attribute } => attribute.key(),
            Directive::CaptureSelection { key, .. } => key,
        }
    }
}

/// Step은 스크립트 내 발화 한 건을 표현한다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// 노출할 메시지.
    pub text: String,
    /// 발신자. 스크립트에서는 항상 bot이다.
    #[serde(default)]
    pub sender: Sender,
    /// 입력 대기 지시어.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<Directive>,
    /// 계산된 타이핑 지연 대신 사용할 지연(ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl Step {
    /// 지시어 없는 봇 Step을 만든다.
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            directive: None,
            delay_ms: None,
        }
    }

    /// 속성 입력을 기다리는 봇 Step을 만든다.
    pub fn ask_attribute(text: impl Into<String>, attribute: AttributeKind) -> Self {
        Self {
            directive: Some(Directive::CaptureAttribute { attribute }),
            ..Self::say(text)
        }
    }

    /// 옵션 선택을 기다리는 봇 Step을 만든다.
    pub fn ask_selection(text: impl Into<String>, cardinality: usize) -> Self {
        Self {
            directive: Some(Directive::CaptureSelection {
                cardinality,
                key: default_selection_key(),
            }),
            ..Self::say(text)
        }
    }
}

/// Script는 하나의 대화 변형을 구성하는 Step 목록이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// 스크립트 표시 이름.
    pub name: String,
    /// 순서대로 노출될 Step 목록.
    pub steps: Vec<Step>,
}

impl Script {
    /// 이름과 Step 목록으로 스크립트를 만들고 검증한다.
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Result<Self, ScriptError> {
        let script = Self {
            name: name.into(),
            steps,
        };
        script.validate()?;
        Ok(script)
    }

    /// 전체 Step 수를 반환한다.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step 수가 비었는지 여부를 확인한다.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 지시어가 붙은 Step 수를 반환한다.
    pub fn directive_count(&self) -> usize {
        self.steps.iter().filter(|s| s.directive.is_some()).count()
    }

    /// 실행 전에 구조적 오류를 확인한다.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.steps.is_empty() {
            return Err(ScriptError::EmptyScript(self.name.clone()));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.text.trim().is_empty() {
                return Err(ScriptError::EmptyText { index });
            }
            if step.sender != Sender::Bot {
                return Err(ScriptError::ScriptedUserStep { index });
            }
            if let Some(Directive::CaptureSelection { cardinality, key }) = &step.directive {
                if *cardinality == 0 {
                    return Err(ScriptError::ZeroCardinality { index });
                }
                if key.trim().is_empty() {
                    return Err(ScriptError::EmptySelectionKey { index });
                }
            }
        }
        Ok(())
    }
}

fn default_selection_key() -> String {
    "selection".to_string()
}

/// YAML 파일을 읽어 Script로 역직렬화한다.
pub fn load_script_from_file(path: &Path) -> anyhow::Result<Script> {
    let mut file =
        File::open(path).with_context(|| format!("스크립트 파일 열기 실패: {}", path.display()))?;
    load_script_from_reader(&mut file)
        .with_context(|| format!("스크립트 로딩 실패: {}", path.display()))
}

/// Reader에서 YAML을 읽어 Script 구조체로 파싱하고 검증한다.
pub fn load_script_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Script> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    load_script_from_str(&buf)
}

/// YAML 문자열을 Script로 파싱하고 검증한다.
pub fn load_script_from_str(source: &str) -> anyhow::Result<Script> {
    let script: Script = serde_yaml::from_str(source)?;
    script.validate()?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_directives() {
        let yaml = r#"
name: sample
steps:
  - text: "안녕하세요"
  - text: "생년월일을 알려 주세요"
    directive: { kind: capture-attribute, attribute: date-of-birth }
  - text: "카드를 골라 주세요"
    delay_ms: 10
    directive: { kind: capture-selection, cardinality: 3 }
"#;
        let script = load_script_from_str(yaml).expect("스크립트 파싱 실패");
        assert_eq!(script.len(), 3);
        assert_eq!(script.directive_count(), 2);
        assert_eq!(script.steps[0].directive, None);
        assert_eq!(
            script.steps[1].directive,
            Some(Directive::CaptureAttribute {
                attribute: AttributeKind::DateOfBirth
            })
        );
        assert_eq!(script.steps[2].delay_ms, Some(10));
        assert_eq!(
            script.steps[2].directive.as_ref().map(|d| d.key()),
            Some("selection")
        );
    }

    #[test]
    fn rejects_unknown_directive_kind_at_load() {
        let yaml = r#"
name: sample
steps:
  - text: "무엇이든"
    directive: { kind: capture-mood }
"#;
        assert!(load_script_from_str(yaml).is_err());
    }

    #[test]
    fn rejects_unknown_attribute_kind_at_load() {
        let yaml = r#"
name: sample
steps:
  - text: "별자리는?"
    directive: { kind: capture-attribute, attribute: zodiac }
"#;
        assert!(load_script_from_str(yaml).is_err());
    }

    #[test]
    fn rejects_scripted_user_step() {
        let yaml = r#"
name: sample
steps:
  - text: "제가 말할게요"
    sender: user
"#;
        let err = load_script_from_str(yaml).expect_err("user Step은 거부되어야 한다");
        let script_err = err
            .downcast_ref::<ScriptError>()
            .expect("ScriptError로 보고되어야 한다");
        assert!(matches!(
            script_err,
            ScriptError::ScriptedUserStep { index: 0 }
        ));
    }

    #[test]
    fn rejects_zero_cardinality_and_empty_script() {
        let zero = Script::new("zero", vec![Step::ask_selection("골라 주세요", 0)]);
        assert!(matches!(zero, Err(ScriptError::ZeroCardinality { index: 0 })));
        let empty = Script::new("empty", Vec::new());
        assert!(matches!(empty, Err(ScriptError::EmptyScript(_))));
    }

    #[test]
    fn consecutive_directive_steps_are_legal() {
        let script = Script::new(
            "twice",
            vec![
                Step::ask_attribute("생년월일?", AttributeKind::DateOfBirth),
                Step::ask_attribute("성별?", AttributeKind::Gender),
            ],
        );
        assert!(script.is_ok());
    }
}
