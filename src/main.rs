mod terminal;

use anyhow::Context;
use clap::Parser;
use fortune_intake::config::load_config;
use fortune_intake::engine::{IntakeSession, RevealPolicy, RunBuilder};
use fortune_intake::handoff::{LoggingReadingService, ReadingRequest, ReadingService};
use fortune_intake::variant::{ProfileSnapshot, ScriptLibrary};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use terminal::{line_to_event, render_event};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing_subscriber::EnvFilter;

/// 터미널에서 접수 대화를 진행한다.
#[derive(Debug, Parser)]
#[command(name = "fortune-intake", version, about = "스크립트 기반 타로 접수 대화")]
struct Args {
    /// 엔진 설정 YAML 경로.
    #[arg(long, default_value = "intake.yaml")]
    config: PathBuf,
    /// 스크립트 YAML 디렉터리. 설정 파일 값보다 우선한다.
    #[arg(long)]
    scripts_dir: Option<PathBuf>,
    /// 프로필이 이미 완성된 사용자로 시작한다.
    #[arg(long)]
    profile_complete: bool,
    /// 타이핑 지연 없이 바로 노출한다.
    #[arg(long)]
    instant: bool,
}

/// 설정과 스크립트를 읽고 표준 입력으로 대화를 진행하는 진입점입니다.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = load_config(Some(args.config.as_path())).context("설정 로딩 실패")?;
    if args.instant {
        config.reveal = RevealPolicy::instant();
    }
    let library = match args.scripts_dir.as_ref().or(config.scripts_dir.as_ref()) {
        Some(dir) => ScriptLibrary::load_dir(dir)?,
        None => ScriptLibrary::builtin()?,
    };

    let profile = if args.profile_complete {
        ProfileSnapshot {
            character_id: Some("local".into()),
            date_of_birth: Some("951225".into()),
            gender: Some("female".into()),
            blood_type: None,
        }
    } else {
        ProfileSnapshot::default()
    };
    let (variant, script) = library.for_profile(&profile);
    println!("스크립트: {} ({variant:?})\n", script.name);

    let pool = Arc::new(config.option_pool());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (done_tx, mut done_rx) = oneshot::channel();
    let builder = RunBuilder::new(script)
        .option_pool(pool.clone())
        .reveal_policy(config.reveal)
        .events(events_tx)
        .on_complete(move |payload| {
            let _ = done_tx.send(payload);
        });

    let mut session = IntakeSession::new();
    session.begin(builder)?;
    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());

    let payload = loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                if let Some(text) = render_event(&event, &pool) {
                    println!("{text}");
                }
            }
            result = &mut done_rx => {
                break result.context("완료 결과를 받지 못했습니다.")?;
            }
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    let pending = session.run().and_then(|run| run.pending_directive());
                    match line_to_event(&line, pending.as_ref()) {
                        Ok(event) => {
                            if let Err(err) = session.dispatch(event) {
                                tracing::debug!("입력 거부: {err}");
                            }
                        }
                        Err(message) => println!("⚠️  {message}"),
                    }
                }
                Some(Err(err)) => return Err(err).context("표준 입력 읽기 실패"),
                None => {
                    session.end();
                    return Ok(());
                }
            },
        }
    };

    while let Ok(event) = events_rx.try_recv() {
        if let Some(text) = render_event(&event, &pool) {
            println!("{text}");
        }
    }
    session.end();

    let request = ReadingRequest::new(&payload, &profile);
    let service = LoggingReadingService::default();
    let session_id = service
        .create_session(&request)
        .await
        .context("운세 세션 생성 실패")?;
    println!(
        "\n세션 {session_id} 생성 요청:\n{}",
        serde_json::to_string_pretty(&request)?
    );
    Ok(())
}
