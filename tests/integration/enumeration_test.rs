// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::fake_delivery::{plain_content_type, rte_content_type, FakeDelivery};
use super::helpers::ProgressLog;
use rtescan::domain::delivery::api::DeliveryError;
use rtescan::domain::models::entry::{ContentTypeId, Locale};
use rtescan::domain::services::content_types::ContentTypeEnumerator;
use rtescan::domain::services::locales::LocaleResolver;
use rtescan::domain::services::progress::ProgressReporter;
use rtescan::utils::retry_policy::RetryPolicy;
use std::sync::Arc;

/// 150 个内容类型分两页取完
#[tokio::test]
async fn test_content_types_are_paged() {
    let mut fake = FakeDelivery::new();
    for i in 0..150 {
        fake = fake.with_content_type(rte_content_type(&format!("type_{:03}", i)));
    }
    let api = Arc::new(fake);

    let enumerator =
        ContentTypeEnumerator::new(api.clone(), RetryPolicy::fast(), 100, ProgressReporter::silent());
    let content_types = enumerator.list_content_types().await.unwrap();

    assert_eq!(content_types.len(), 150);
    assert_eq!(content_types[149].id, ContentTypeId::from("type_149"));
    let skips: Vec<_> = api
        .requests_to("/v3/content_types")
        .iter()
        .map(|r| r.param("skip").unwrap().to_string())
        .collect();
    assert_eq!(skips, vec!["0", "100"]);
}

#[tokio::test]
async fn test_content_type_schemas_become_detectors() {
    let api = Arc::new(
        FakeDelivery::new()
            .with_content_type(rte_content_type("blog"))
            .with_content_type(plain_content_type("author")),
    );

    let enumerator =
        ContentTypeEnumerator::new(api, RetryPolicy::fast(), 100, ProgressReporter::silent());
    let content_types = enumerator.list_content_types().await.unwrap();

    assert_eq!(content_types.len(), 2);
    assert_eq!(content_types[0].title.as_deref(), Some("blog"));
    assert_eq!(content_types[0].display_name(), "blog");
    assert_eq!(content_types[0].detector.paths().len(), 1);
    assert!(content_types[1].detector.is_empty());
}

#[tokio::test]
async fn test_content_type_failure_is_reported() {
    let api = Arc::new(FakeDelivery::new().fail(
        "/v3/content_types",
        None,
        None,
        DeliveryError::Auth { status: 401 },
    ));

    let enumerator =
        ContentTypeEnumerator::new(api.clone(), RetryPolicy::fast(), 100, ProgressReporter::silent());
    let err = enumerator.list_content_types().await.unwrap_err();

    assert_eq!(err, DeliveryError::Auth { status: 401 });
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_locales_are_deduplicated() {
    let api = Arc::new(FakeDelivery::new().with_locales(&["en-us", "fr-fr", "en-us", "de-de"]));

    let resolver = LocaleResolver::new(
        api,
        RetryPolicy::fast(),
        Locale::from("en-us"),
        ProgressReporter::silent(),
    );
    let locales = resolver.list_locales().await.unwrap();

    assert_eq!(
        locales,
        vec![
            Locale::from("en-us"),
            Locale::from("fr-fr"),
            Locale::from("de-de")
        ]
    );
}

/// stack 未报告语言时回退到主语言并提示
#[tokio::test]
async fn test_empty_locale_list_falls_back_to_master_locale() {
    let api = Arc::new(FakeDelivery::new());
    let log = ProgressLog::new();
    let (reporter, forwarder) = log.reporter();

    let resolver = LocaleResolver::new(
        api,
        RetryPolicy::fast(),
        Locale::from("en-us"),
        reporter.clone(),
    );
    let locales = resolver.list_locales().await.unwrap();
    drop(resolver);
    drop(reporter);
    forwarder.await.unwrap();

    assert_eq!(locales, vec![Locale::from("en-us")]);
    assert_eq!(log.count_containing("falling back to master locale 'en-us'"), 1);
}
