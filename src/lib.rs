//! 스크립트 기반 대화형 운세 접수 엔진.

pub mod config;
pub mod engine;
pub mod error;
pub mod handoff;
pub mod pool;
pub mod script;
pub mod variant;
