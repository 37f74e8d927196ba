// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::DeliveryApi;
use crate::domain::models::entry::{ContentTypeId, EntryRecord, Locale};
use crate::domain::models::outcome::{FailedPair, ScanOutcome, ScanStatus};
use crate::domain::models::scan::{ScanConfig, ScanTuning, VersionPolicy};
use crate::domain::services::content_types::{ContentType, ContentTypeEnumerator};
use crate::domain::services::entry_paginator::EntryPaginator;
use crate::domain::services::locales::LocaleResolver;
use crate::domain::services::progress::ProgressReporter;
use crate::domain::services::result_aggregator::ResultAggregator;
use crate::domain::services::version_walker::VersionWalker;
use crate::infrastructure::delivery::cda_client::CdaClient;
use crate::infrastructure::delivery::request_gate::RequestGate;
use crate::utils::errors::{PairError, ScanError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use metrics::counter;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use validator::Validate;

/// 富文本 null 扫描器
///
/// 遍历 内容类型 × 语言 × 条目 × 版本，收集富文本字段为 null 的条目。
/// 所有请求都经过同一个 [`RequestGate`]，并发上限对分页和版本复查同时生效。
pub struct Scanner {
    api: Arc<dyn DeliveryApi>,
    tuning: ScanTuning,
}

impl Scanner {
    /// 基于任意交付API实现创建扫描器
    ///
    /// 并发上限至少为 1。
    pub fn new(api: Arc<dyn DeliveryApi>, mut tuning: ScanTuning) -> Self {
        tuning.concurrency = tuning.concurrency.max(1);
        let gate = RequestGate::new(api, tuning.concurrency, tuning.requests_per_second);
        Self {
            api: Arc::new(gate),
            tuning,
        }
    }

    /// 连接到配置区域的交付API
    pub fn connect(config: &ScanConfig, tuning: ScanTuning) -> Result<Self, ScanError> {
        let base_url = config.region.base_url();
        Self::connect_with_base_url(config, &base_url, tuning)
    }

    /// 连接到指定主机的交付API
    pub fn connect_with_base_url(
        config: &ScanConfig,
        base_url: &str,
        tuning: ScanTuning,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        tuning.validate()?;
        let client = CdaClient::with_base_url(config, base_url, tuning.request_timeout)
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        Ok(Self::new(Arc::new(client), tuning))
    }

    pub fn tuning(&self) -> &ScanTuning {
        &self.tuning
    }

    /// 执行一次完整扫描
    pub async fn scan<F>(&self, on_progress: F) -> Result<ScanOutcome, ScanError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.scan_until(on_progress, CancellationToken::new()).await
    }

    /// 执行一次可取消的扫描
    ///
    /// 取消后在途请求被丢弃，未完成的组合记为失败，已累积的结果照常返回。
    pub async fn scan_until<F>(
        &self,
        on_progress: F,
        cancel: CancellationToken,
    ) -> Result<ScanOutcome, ScanError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let (progress, forwarder) = ProgressReporter::spawn(on_progress);
        let span = info_span!("scan", scan_id = %Uuid::new_v4());
        let result = self.run(&progress, &cancel).instrument(span).await;

        drop(progress);
        if let Err(e) = forwarder.await {
            warn!("Progress callback failed: {}", e);
        }
        result
    }

    async fn run(
        &self,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        let started_at = Utc::now();
        progress.report("Starting scan");

        let enumerator = ContentTypeEnumerator::new(
            self.api.clone(),
            self.tuning.retry.clone(),
            self.tuning.page_size,
            progress.clone(),
        );
        let content_types = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                progress.report("Scan cancelled before content types were listed");
                return Ok(Self::outcome(started_at, &ResultAggregator::new(), Vec::new(), 0, Vec::new(), true));
            }
            listed = enumerator.list_content_types() => listed.map_err(|e| {
                let err = ScanError::enumeration("content types", e);
                progress.report(format!("Scan aborted: {}", err));
                err
            })?,
        };
        progress.report(format!("Found {} content types", content_types.len()));

        let resolver = LocaleResolver::new(
            self.api.clone(),
            self.tuning.retry.clone(),
            Locale::new(self.tuning.default_locale.clone()),
            progress.clone(),
        );
        let locales = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                progress.report("Scan cancelled before locales were listed");
                return Ok(Self::outcome(started_at, &ResultAggregator::new(), Vec::new(), content_types.len(), Vec::new(), true));
            }
            listed = resolver.list_locales() => listed.map_err(|e| {
                let err = ScanError::enumeration("locales", e);
                progress.report(format!("Scan aborted: {}", err));
                err
            })?,
        };
        progress.report(format!(
            "Found {} locales: {}",
            locales.len(),
            locales
                .iter()
                .map(Locale::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let mut pairs: Vec<(&ContentType, &Locale)> = Vec::new();
        for content_type in &content_types {
            if content_type.detector.is_empty() {
                progress.report(format!(
                    "Content type '{}' has no rich-text fields, skipping",
                    content_type.id
                ));
                continue;
            }
            info!(
                "Content type '{}' rich-text fields: {}",
                content_type.id,
                content_type
                    .detector
                    .paths()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            pairs.extend(locales.iter().map(|locale| (content_type, locale)));
        }

        let aggregator = ResultAggregator::new();
        let mut pending: HashSet<(&ContentTypeId, &Locale)> =
            pairs.iter().map(|(ct, locale)| (&ct.id, *locale)).collect();
        let mut failed_pairs = Vec::new();
        let mut cancelled = false;

        {
            let aggregator = &aggregator;
            let mut results = stream::iter(pairs.iter().copied())
                .map(|(content_type, locale)| async move {
                    let found = self
                        .scan_pair(content_type, locale, aggregator, progress)
                        .await;
                    (content_type, locale, found)
                })
                .buffer_unordered(self.tuning.concurrency);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    next = results.next() => {
                        let Some((content_type, locale, found)) = next else {
                            break;
                        };
                        pending.remove(&(&content_type.id, locale));
                        match found {
                            Ok(PairScan { found, unresolved: None }) => progress.report(format!(
                                "Finished '{}' ({}): {} affected entries",
                                content_type.id, locale, found
                            )),
                            Ok(PairScan { found, unresolved: Some(e) }) => {
                                counter!("rtescan_failed_pairs_total").increment(1);
                                progress.report(format!(
                                    "Finished '{}' ({}) with unchecked versions: {} affected entries, {}",
                                    content_type.id, locale, found, e
                                ));
                                failed_pairs.push(FailedPair {
                                    content_type_id: content_type.id.clone(),
                                    locale: locale.clone(),
                                    reason: e.to_string(),
                                });
                            }
                            Err(PairError::Auth(e)) => {
                                progress.report(format!("Scan aborted: credentials rejected ({})", e));
                                return Err(ScanError::Auth(e));
                            }
                            Err(e) => {
                                counter!("rtescan_failed_pairs_total").increment(1);
                                progress.report(format!(
                                    "Skipping '{}' ({}): {}",
                                    content_type.id, locale, e
                                ));
                                failed_pairs.push(FailedPair {
                                    content_type_id: content_type.id.clone(),
                                    locale: locale.clone(),
                                    reason: e.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        if cancelled {
            progress.report(format!(
                "Scan cancelled with {} pairs unfinished",
                pending.len()
            ));
            for (content_type, locale) in &pairs {
                if pending.contains(&(&content_type.id, *locale)) {
                    failed_pairs.push(FailedPair {
                        content_type_id: content_type.id.clone(),
                        locale: (*locale).clone(),
                        reason: "cancelled".to_string(),
                    });
                }
            }
        }

        let outcome = Self::outcome(
            started_at,
            &aggregator,
            failed_pairs,
            content_types.len(),
            locales.clone(),
            cancelled,
        );
        progress.report(format!(
            "Scan {}: {} affected entries, {} failed pairs",
            outcome.status,
            outcome.affected.len(),
            outcome.failed_pairs.len()
        ));
        Ok(outcome)
    }

    fn outcome(
        started_at: DateTime<Utc>,
        aggregator: &ResultAggregator,
        failed_pairs: Vec<FailedPair>,
        content_types_scanned: usize,
        locales: Vec<Locale>,
        cancelled: bool,
    ) -> ScanOutcome {
        let status = if failed_pairs.is_empty() && !cancelled {
            ScanStatus::Completed
        } else {
            ScanStatus::PartiallyFailed
        };
        ScanOutcome {
            affected: aggregator.snapshot(),
            failed_pairs,
            status,
            cancelled,
            content_types_scanned,
            locales,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// 扫描单个 (内容类型, 语言) 组合
    ///
    /// 分页失败会结束该组合；单个条目的历史版本无法获取时只记录失败，继续扫描后续条目。
    async fn scan_pair(
        &self,
        content_type: &ContentType,
        locale: &Locale,
        aggregator: &ResultAggregator,
        progress: &ProgressReporter,
    ) -> Result<PairScan, PairError> {
        progress.report(format!(
            "Scanning '{}' ({})",
            content_type.display_name(),
            locale
        ));

        let paginator = EntryPaginator::new(
            self.api.clone(),
            self.tuning.retry.clone(),
            self.tuning.page_size,
            progress.clone(),
        );
        let walker = VersionWalker::new(
            self.api.clone(),
            self.tuning.retry.clone(),
            progress.clone(),
        );
        let walker = &walker;

        paginator
            .paginate_entries(&content_type.id, locale)
            .map_ok(|payload| {
                self.inspect_entry(content_type, locale, payload, walker, aggregator, progress)
            })
            .try_buffer_unordered(self.tuning.concurrency)
            .try_fold(PairScan::default(), |total, entry| async move {
                Ok(total.merge(entry))
            })
            .await
    }

    async fn inspect_entry(
        &self,
        content_type: &ContentType,
        locale: &Locale,
        payload: Value,
        walker: &VersionWalker,
        aggregator: &ResultAggregator,
        progress: &ProgressReporter,
    ) -> Result<PairScan, PairError> {
        let Some(record) = entry_record(content_type, locale, &payload) else {
            warn!(
                "Skipping entry without uid in '{}' ({})",
                content_type.id, locale
            );
            return Ok(PairScan::default());
        };

        if !record.rte_is_null {
            return Ok(PairScan::default());
        }

        // 最新版本已由分页结果确认，先于历史版本记录
        let mut scan = PairScan::default();
        if aggregator.add(record.affected_at(record.version)) {
            scan.found += 1;
        }

        if self.tuning.version_policy == VersionPolicy::Latest {
            return Ok(scan);
        }

        let walk = walker.walk_history(&record, &content_type.detector).await;
        scan.found += walk
            .null_versions
            .into_iter()
            .filter(|version| aggregator.add(record.affected_at(*version)))
            .count();

        for (version, err) in walk.unresolved {
            if matches!(err, PairError::Auth(_)) {
                return Err(err);
            }
            progress.report(format!(
                "{} ({}) entry {} v{} could not be checked: {}",
                record.content_type_id, record.locale, record.entry_id, version, err
            ));
            scan.unresolved.get_or_insert(err);
        }

        Ok(scan)
    }
}

/// 单个组合的扫描结果
#[derive(Debug, Default)]
struct PairScan {
    /// 新增的受影响条目数
    found: usize,
    /// 第一个无法检测的历史版本错误，存在时该组合记为失败
    unresolved: Option<PairError>,
}

impl PairScan {
    fn merge(mut self, other: PairScan) -> PairScan {
        self.found += other.found;
        if self.unresolved.is_none() {
            self.unresolved = other.unresolved;
        }
        self
    }
}

/// 从分页返回的原始条目构造检查记录
///
/// 条目自带的 `locale` 优先于请求的语言（未本地化的条目会以回退语言返回）。
fn entry_record(content_type: &ContentType, locale: &Locale, payload: &Value) -> Option<EntryRecord> {
    let entry_id = payload["uid"].as_str()?;
    Some(EntryRecord {
        entry_id: entry_id.to_string(),
        content_type_id: content_type.id.clone(),
        locale: payload["locale"]
            .as_str()
            .map(Locale::new)
            .unwrap_or_else(|| locale.clone()),
        version: payload["_version"].as_u64().unwrap_or(1),
        rte_is_null: content_type.detector.is_rte_null(payload),
    })
}

/// 按连接参数执行一次扫描
///
/// 调用方传入连接参数与进度回调，得到受影响条目集合、失败组合与最终状态。
/// 认证失败或无法枚举内容类型/语言时返回错误，不返回部分结果。
pub async fn get_cda_null_entries<F>(
    config: &ScanConfig,
    tuning: ScanTuning,
    on_progress: F,
) -> Result<ScanOutcome, ScanError>
where
    F: Fn(String) + Send + Sync + 'static,
{
    Scanner::connect(config, tuning)?.scan(on_progress).await
}
