// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use rtescan::config::settings::Settings;
use rtescan::utils::telemetry;
use rtescan::{ScanStatus, Scanner};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 主函数
///
/// 加载配置并执行一次扫描，结果以 JSON 输出到 stdout。
/// 扫描完整时退出码为 0，部分失败时为 2。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting rtescan...");

    // 2. Load configuration
    let settings = Settings::new()?;
    let config = settings.scan_config();
    let tuning = settings.scan_tuning();
    info!(
        "Configuration loaded: region {}, environment '{}', branch '{}'",
        config.region, config.environment, config.branch_name
    );

    // 3. Connect
    let scanner = match settings.delivery.host.as_deref() {
        Some(host) => Scanner::connect_with_base_url(&config, host, tuning)?,
        None => Scanner::connect(&config, tuning)?,
    };
    let tuning = scanner.tuning();
    info!(
        "Scan tuning: page size {}, concurrency {}, {} req/s, versions {:?}",
        tuning.page_size, tuning.concurrency, tuning.requests_per_second, tuning.version_policy
    );

    // 4. Wire Ctrl-C to cancellation
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown signal received, cancelling scan");
                on_signal.cancel();
            }
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    });

    // 5. Scan (progress messages already go to stderr through tracing)
    let outcome = scanner.scan_until(|_| {}, cancel).await?;

    let report = json!({
        "status": outcome.status,
        "cancelled": outcome.cancelled,
        "content_types_scanned": outcome.content_types_scanned,
        "locales": outcome.locales,
        "affected": outcome.affected.to_sorted_vec(),
        "failed_pairs": outcome.failed_pairs,
        "started_at": outcome.started_at,
        "finished_at": outcome.finished_at,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if outcome.status == ScanStatus::PartiallyFailed {
        std::process::exit(2);
    }
    Ok(())
}
