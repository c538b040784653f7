//! 어떤 스크립트로 대화를 시작할지 고르는 호출자 쪽 전제 조건.
//!
//! 엔진은 이 분기를 스스로 판단하지 않는다. 호출자가 `select_variant`를
//! 대화 시작 전에 한 번 평가하고 그 결과에 맞는 Script를 넘긴다.

use crate::engine::parse_birth_date;
use crate::script::{Script, load_script_from_file, load_script_from_str};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const BUILTIN_COMPLETE: &str = include_str!("../scripts/profile_complete.yaml");
const BUILTIN_INCOMPLETE: &str = include_str!("../scripts/profile_incomplete.yaml");

/// 계정 서비스에서 가져온 캐릭터 프로필 요약이다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub character_id: Option<String>,
    /// YYMMDD.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
}

impl ProfileSnapshot {
    /// 저장된 값을 Collected State와 같은 키로 반환한다.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        [
            ("date-of-birth", &self.date_of_birth),
            ("gender", &self.gender),
            ("blood-type", &self.blood_type),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }
}

/// 준비된 스크립트 변형이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptVariant {
    /// 프로필이 완성되어 카드 선택만 진행한다.
    ProfileComplete,
    /// 생년월일/성별부터 입력받는다.
    ProfileIncomplete,
}

impl ScriptVariant {
    /// 스크립트 디렉터리에서 찾을 파일 이름이다.
    pub fn file_name(&self) -> &'static str {
        match self {
            ScriptVariant::ProfileComplete => "profile_complete.yaml",
            ScriptVariant::ProfileIncomplete => "profile_incomplete.yaml",
        }
    }
}

/// 프로필이 완성되었는지 판단해 스크립트 변형을 고른다.
///
/// 생년월일이 유효한 6자리이고 성별이 채워져 있으면 완성으로 본다.
pub fn select_variant(profile: &ProfileSnapshot) -> ScriptVariant {
    let has_birth_date = profile
        .date_of_birth
        .as_deref()
        .is_some_and(|raw| parse_birth_date(raw).is_ok());
    let has_gender = profile
        .gender
        .as_deref()
        .is_some_and(|g| !g.trim().is_empty());
    if has_birth_date && has_gender {
        ScriptVariant::ProfileComplete
    } else {
        ScriptVariant::ProfileIncomplete
    }
}

/// 변형별 스크립트 묶음이다. 스크립트는 여러 Run에서 읽기 전용으로 공유된다.
#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    complete: Arc<Script>,
    incomplete: Arc<Script>,
}

impl ScriptLibrary {
    /// 바이너리에 포함된 기본 스크립트를 사용한다.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self {
            complete: Arc::new(
                load_script_from_str(BUILTIN_COMPLETE).context("기본 profile_complete 스크립트")?,
            ),
            incomplete: Arc::new(
                load_script_from_str(BUILTIN_INCOMPLETE)
                    .context("기본 profile_incomplete 스크립트")?,
            ),
        })
    }

    /// 디렉터리에서 두 변형의 YAML 파일을 읽는다.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let load = |variant: ScriptVariant| -> anyhow::Result<Arc<Script>> {
            let path = dir.join(variant.file_name());
            debug!(path = %path.display(), "스크립트 로딩");
            load_script_from_file(&path).map(Arc::new)
        };
        Ok(Self {
            complete: load(ScriptVariant::ProfileComplete)?,
            incomplete: load(ScriptVariant::ProfileIncomplete)?,
        })
    }

    /// 변형에 해당하는 스크립트를 반환한다.
    pub fn get(&self, variant: ScriptVariant) -> Arc<Script> {
        match variant {
            ScriptVariant::ProfileComplete => Arc::clone(&self.complete),
            ScriptVariant::ProfileIncomplete => Arc::clone(&self.incomplete),
        }
    }

    /// 프로필로 변형을 고르고 해당 스크립트를 함께 반환한다.
    pub fn for_profile(&self, profile: &ProfileSnapshot) -> (ScriptVariant, Arc<Script>) {
        let variant = select_variant(profile);
        (variant, self.get(variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Directive;

    #[test]
    fn complete_profile_selects_short_script() {
        let profile = ProfileSnapshot {
            character_id: Some("c1".into()),
            date_of_birth: Some("951225".into()),
            gender: Some("female".into()),
            blood_type: None,
        };
        assert_eq!(select_variant(&profile), ScriptVariant::ProfileComplete);
    }

    #[test]
    fn missing_or_invalid_fields_select_intake_script() {
        assert_eq!(
            select_variant(&ProfileSnapshot::default()),
            ScriptVariant::ProfileIncomplete
        );
        let bad_date = ProfileSnapshot {
            date_of_birth: Some("95122".into()),
            gender: Some("male".into()),
            ..Default::default()
        };
        assert_eq!(select_variant(&bad_date), ScriptVariant::ProfileIncomplete);
    }

    #[test]
    fn builtin_incomplete_script_ends_with_selection_after_attributes() {
        let library = ScriptLibrary::builtin().expect("기본 스크립트 로딩 실패");
        let script = library.get(ScriptVariant::ProfileIncomplete);
        let directives: Vec<&Directive> =
            script.steps.iter().filter_map(|s| s.directive.as_ref()).collect();
        assert!(directives.len() >= 2);
        assert!(matches!(
            directives.last(),
            Some(Directive::CaptureSelection { cardinality: 3, .. })
        ));
        assert!(
            directives[..directives.len() - 1]
                .iter()
                .all(|d| matches!(d, Directive::CaptureAttribute { .. }))
        );

        let complete = library.get(ScriptVariant::ProfileComplete);
        assert_eq!(complete.directive_count(), 1);
    }

    #[test]
    fn profile_attributes_use_collected_keys() {
        let profile = ProfileSnapshot {
            date_of_birth: Some("951225".into()),
            blood_type: Some("O".into()),
            ..Default::default()
        };
        let attrs = profile.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("blood-type").map(String::as_str), Some("O"));
    }
}
