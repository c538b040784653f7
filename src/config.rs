use crate::engine::RevealPolicy;
use crate::error::ConfigError;
use crate::pool::OptionPool;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 엔진 실행 설정이다. 모든 필드는 생략 가능하다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// 타이핑 연출 지연 정책.
    pub reveal: RevealPolicy,
    /// 스크립트 YAML 디렉터리. 없으면 내장 스크립트를 사용한다.
    pub scripts_dir: Option<PathBuf>,
    /// 선택 지시어 옵션 라벨. 없으면 타로 메이저 아르카나 22장을 사용한다.
    pub option_labels: Option<Vec<String>>,
}

impl EngineConfig {
    /// 설정 값 범위를 확인한다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal.max_ms < self.reveal.base_ms {
            return Err(ConfigError::InvalidValue {
                key: "reveal.max_ms".into(),
                message: format!(
                    "base_ms({})보다 작을 수 없습니다.",
                    self.reveal.base_ms
                ),
            });
        }
        if matches!(&self.option_labels, Some(labels) if labels.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "option_labels".into(),
                message: "비어 있을 수 없습니다.".into(),
            });
        }
        Ok(())
    }

    /// 설정에 맞는 옵션 풀을 만든다.
    pub fn option_pool(&self) -> OptionPool {
        match &self.option_labels {
            Some(labels) => OptionPool::from_labels(labels.iter().cloned()),
            None => OptionPool::tarot_major_arcana(),
        }
    }
}

/// YAML 문자열을 설정으로 파싱한다.
pub fn parse_config(source: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = serde_yaml::from_str(source)?;
    config.validate()?;
    Ok(config)
}

/// 설정 파일을 읽는다. 경로가 없거나 파일이 존재하지 않으면 기본값을 사용한다.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    if !path.exists() {
        debug!(path = %path.display(), "설정 파일이 없어 기본값 사용");
        return Ok(EngineConfig::default());
    }
    let source = std::fs::read_to_string(path)?;
    parse_config(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = parse_config("reveal:\n  base_ms: 100\n").expect("설정 파싱 실패");
        assert_eq!(config.reveal.base_ms, 100);
        assert_eq!(config.reveal.per_char_ms, RevealPolicy::default().per_char_ms);
        assert_eq!(config.option_pool().len(), 22);
    }

    #[test]
    fn custom_labels_build_custom_pool() {
        let config =
            parse_config("option_labels: [\"사과\", \"배\", \"감\"]\n").expect("설정 파싱 실패");
        let pool = config.option_pool();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(2).map(|i| i.label.as_str()), Some("감"));
    }

    #[test]
    fn rejects_inconsistent_values_and_unknown_keys() {
        assert!(matches!(
            parse_config("reveal: { base_ms: 500, max_ms: 100 }\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_config("option_labels: []\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_config("reveal_speed: 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some(Path::new("/definitely/not/here.yaml")))
            .expect("기본값이어야 한다");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(load_config(None).expect("기본값"), EngineConfig::default());
    }
}
