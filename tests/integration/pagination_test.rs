// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::fake_delivery::{clean_entries, rate_limited, FakeDelivery};
use super::helpers::ProgressLog;
use futures::TryStreamExt;
use rtescan::domain::delivery::api::DeliveryError;
use rtescan::domain::models::entry::{ContentTypeId, Locale};
use rtescan::domain::services::entry_paginator::EntryPaginator;
use rtescan::utils::errors::PairError;
use rtescan::utils::retry_policy::RetryPolicy;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const ENTRIES_PATH: &str = "/v3/content_types/blog/entries";

async fn collect(
    api: Arc<FakeDelivery>,
    log: &ProgressLog,
) -> Result<Vec<Value>, PairError> {
    collect_with(api, log, RetryPolicy::fast()).await
}

async fn collect_with(
    api: Arc<FakeDelivery>,
    log: &ProgressLog,
    policy: RetryPolicy,
) -> Result<Vec<Value>, PairError> {
    let (reporter, forwarder) = log.reporter();
    let paginator = EntryPaginator::new(api, policy, 100, reporter.clone());
    let result = paginator
        .paginate_entries(&ContentTypeId::from("blog"), &Locale::from("en-us"))
        .try_collect::<Vec<_>>()
        .await;

    drop(paginator);
    drop(reporter);
    forwarder.await.unwrap();
    result
}

fn uids(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e["uid"].as_str().unwrap().to_string())
        .collect()
}

/// 250 条条目按 0/100/200 三页取完，无重复无遗漏
#[tokio::test]
async fn test_pages_through_all_entries_in_order() {
    let api = Arc::new(
        FakeDelivery::new().with_entries("blog", "en-us", clean_entries("blt", "en-us", 250)),
    );
    let log = ProgressLog::new();

    let entries = collect(api.clone(), &log).await.unwrap();

    let seen = uids(&entries);
    let unique: HashSet<_> = seen.iter().cloned().collect();
    assert_eq!(seen.len(), 250);
    assert_eq!(unique.len(), 250);
    assert_eq!(seen.first().map(String::as_str), Some("blt000"));
    assert_eq!(seen.last().map(String::as_str), Some("blt249"));

    let requests = api.requests_to(ENTRIES_PATH);
    let skips: Vec<_> = requests.iter().map(|r| r.param("skip").unwrap()).collect();
    assert_eq!(skips, vec!["0", "100", "200"]);
    for request in &requests {
        assert_eq!(request.param("locale"), Some("en-us"));
        assert_eq!(request.param("limit"), Some("100"));
        assert_eq!(request.param("include_count"), Some("true"));
    }
}

/// 第二页限流一次后重试成功，只产生一条退避消息
#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let api = Arc::new(
        FakeDelivery::new()
            .with_entries("blog", "en-us", clean_entries("blt", "en-us", 250))
            .fail(ENTRIES_PATH, Some(100), Some(1), rate_limited()),
    );
    let log = ProgressLog::new();

    let entries = collect(api.clone(), &log).await.unwrap();

    assert_eq!(entries.len(), 250);
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 4);
    assert_eq!(log.count_containing("rate limited, backing off"), 1);
}

/// count 偏大时以空页结束
#[tokio::test]
async fn test_overstated_count_stops_on_empty_page() {
    let api = Arc::new(
        FakeDelivery::new()
            .with_entries("blog", "en-us", clean_entries("blt", "en-us", 120))
            .with_reported_total("blog", "en-us", 500),
    );
    let log = ProgressLog::new();

    let entries = collect(api.clone(), &log).await.unwrap();

    assert_eq!(entries.len(), 120);
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 3);
}

#[tokio::test]
async fn test_empty_pair_yields_nothing() {
    let api = Arc::new(FakeDelivery::new());
    let log = ProgressLog::new();

    let entries = collect(api.clone(), &log).await.unwrap();

    assert!(entries.is_empty());
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 1);
}

/// 持续限流时在 1 + max_retries 次请求后放弃
#[tokio::test]
async fn test_persistent_rate_limit_exhausts_budget() {
    let api = Arc::new(
        FakeDelivery::new()
            .with_entries("blog", "en-us", clean_entries("blt", "en-us", 10))
            .fail(ENTRIES_PATH, Some(0), None, rate_limited()),
    );
    let log = ProgressLog::new();

    let err = collect(api.clone(), &log).await.unwrap_err();

    assert!(matches!(
        err,
        PairError::Exhausted(DeliveryError::RateLimited { .. })
    ));
    let max_retries = RetryPolicy::fast().max_retries as usize;
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 1 + max_retries);
    assert_eq!(log.count_containing("rate limited, backing off"), max_retries);
}

/// 累计等待超过上限时提前放弃，不用满重试次数
#[tokio::test]
async fn test_total_wait_cap_stops_retries_early() {
    let api = Arc::new(
        FakeDelivery::new()
            .with_entries("blog", "en-us", clean_entries("blt", "en-us", 10))
            .fail(
                ENTRIES_PATH,
                Some(0),
                None,
                DeliveryError::RateLimited {
                    retry_after: Some(Duration::from_millis(10)),
                },
            ),
    );
    let policy = RetryPolicy {
        max_retries: 5,
        max_total_wait: Duration::from_millis(15),
        ..RetryPolicy::fast()
    };
    let log = ProgressLog::new();

    let err = collect_with(api.clone(), &log, policy).await.unwrap_err();

    assert!(matches!(
        err,
        PairError::Exhausted(DeliveryError::RateLimited { .. })
    ));
    // 第一次退避 10ms，第二次会累计到 20ms，超过 15ms 上限
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 2);
    assert_eq!(log.count_containing("rate limited, backing off"), 1);
}

/// 非可重试错误不重试
#[tokio::test]
async fn test_client_error_is_not_retried() {
    let api = Arc::new(FakeDelivery::new().fail(
        ENTRIES_PATH,
        None,
        None,
        DeliveryError::Status {
            status: 422,
            body: "invalid query".to_string(),
        },
    ));
    let log = ProgressLog::new();

    let err = collect(api.clone(), &log).await.unwrap_err();

    assert!(matches!(err, PairError::Rejected(DeliveryError::Status { status: 422, .. })));
    assert_eq!(api.requests_to(ENTRIES_PATH).len(), 1);
}
