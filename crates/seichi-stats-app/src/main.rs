//! # seichi-stats
//!
//! 마인크래프트 서버 플레이어 통계 수집기 바이너리 진입점.
//! 업스트림 스냅샷을 주기적으로 가져와 변환한 뒤 시계열 백엔드에 배치로 기록한다.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use seichi_stats_app::lifecycle::LifecycleManager;
use seichi_stats_app::pipeline::PipelineContext;
use seichi_stats_app::scheduler::{Scheduler, SchedulerConfig};
use seichi_stats_core::config::AppConfig;
use seichi_stats_exporter::ExporterServer;

/// 플레이어 통계 텔레메트리 파이프라인
///
/// 설정은 `SEICHI_STATS_` 접두사 환경변수로 지정한다 (예: `SEICHI_STATS_BACKEND__TOKEN`).
#[derive(Parser, Debug)]
#[command(name = "seichi-stats")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 주기 한 번 실행 후 버퍼를 비우고 종료
    #[arg(long)]
    once: bool,

    /// 피드 서버 바인드 주소 (기본: 설정값)
    #[arg(long)]
    listen: Option<String>,

    /// 피드 서버 비활성화
    #[arg(long)]
    no_exporter: bool,
}

const WORKSPACE_TARGETS: [&str; 6] = [
    "seichi_stats",
    "seichi_stats_app",
    "seichi_stats_core",
    "seichi_stats_relabel",
    "seichi_stats_network",
    "seichi_stats_exporter",
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = WORKSPACE_TARGETS
        .iter()
        .map(|t| format!("{t}={}", args.log_level))
        .chain(std::iter::once(format!("tower_http={}", args.log_level)))
        .collect::<Vec<_>>()
        .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let mut config = AppConfig::from_env().context("설정 로드 실패")?;
    if let Some(listen) = args.listen {
        config.exporter.listen_addr = listen;
    }
    if args.no_exporter {
        config.exporter.enabled = false;
    }
    config.validate().context("설정 검증 실패")?;

    info!(
        "seichi-stats v{} 시작: upstream={}, kinds={}, host={}, source={}",
        env!("CARGO_PKG_VERSION"),
        config.upstream_endpoint()?,
        config.upstream.kinds,
        config.source_host,
        config.source_name,
    );
    info!(
        "배치 {}개, 상한 {}개, 폴링 {}s(+{}s), 플러시 {}s, 쓰기 타임아웃 {}s",
        config.buffer.batch_size,
        config.buffer.buffer_limit,
        config.poll.interval_secs,
        config.poll.jitter_secs,
        config.buffer.flush_interval_secs,
        config.backend.timeout_secs,
    );

    let ctx = Arc::new(PipelineContext::from_config(&config).context("파이프라인 구성 실패")?);
    let scheduler = Arc::new(Scheduler::new(SchedulerConfig::from(&config), ctx.clone()));

    if args.once {
        let written = scheduler.run_once().await?;
        info!("단일 실행 완료: {written}개 포인트 기록");
        return Ok(());
    }

    let lifecycle = LifecycleManager::new();

    let exporter_handle = if config.exporter.enabled {
        let server = ExporterServer::new(ctx.feed().clone(), config.listen_addr()?)
            .with_buffer(ctx.buffer().clone());
        let rx = lifecycle.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!("피드 서버 에러: {e}");
            }
        }))
    } else {
        info!("피드 서버 비활성화");
        None
    };

    let scheduler_handle = {
        let scheduler = scheduler.clone();
        let rx = lifecycle.subscribe();
        tokio::spawn(async move { scheduler.run(rx).await })
    };

    lifecycle.wait_for_signal().await;

    if let Err(e) = scheduler_handle.await {
        error!("스케줄러 태스크 비정상 종료: {e}");
    }
    if let Some(handle) = exporter_handle {
        if let Err(e) = handle.await {
            error!("피드 서버 태스크 비정상 종료: {e}");
        }
    }

    let stats = ctx.buffer().stats();
    info!(
        "종료: 기록 {}개, 폐기 {}개, 플러시 실패 {}회",
        stats.flushed_total, stats.dropped_total, stats.failed_flushes
    );
    let lost = stats.buffered + stats.in_flight;
    if lost > 0 {
        warn!("종료 시 기록하지 못한 포인트 {lost}개 유실");
    }
    Ok(())
}
