// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use rtescan::domain::delivery::api::{DeliveryApi, DeliveryError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 记录下来的一次请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// 预设的失败
struct Failure {
    path: String,
    /// 只匹配带有该查询参数值的请求
    param: Option<(&'static str, String)>,
    /// None 表示永远失败
    remaining: Option<usize>,
    error: DeliveryError,
}

/// 内存中的交付API
///
/// 按真实接口的路径与分页参数返回预置数据，可注入失败并统计在途请求。
#[derive(Default)]
pub struct FakeDelivery {
    content_types: Vec<Value>,
    locales: Vec<String>,
    entries: HashMap<(String, String), Vec<Value>>,
    reported_totals: HashMap<(String, String), u64>,
    versions: HashMap<(String, String, u64), Value>,
    failures: Mutex<Vec<Failure>>,
    requests: Mutex<Vec<RecordedRequest>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locales(mut self, codes: &[&str]) -> Self {
        self.locales = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_content_type(mut self, content_type: Value) -> Self {
        self.content_types.push(content_type);
        self
    }

    pub fn with_entries(mut self, content_type: &str, locale: &str, entries: Vec<Value>) -> Self {
        self.entries
            .insert((content_type.to_string(), locale.to_string()), entries);
        self
    }

    /// 让 count 报告一个与实际条目数不同的总数
    pub fn with_reported_total(mut self, content_type: &str, locale: &str, total: u64) -> Self {
        self.reported_totals
            .insert((content_type.to_string(), locale.to_string()), total);
        self
    }

    pub fn with_version(mut self, entry_uid: &str, locale: &str, version: u64, entry: Value) -> Self {
        self.versions
            .insert((entry_uid.to_string(), locale.to_string(), version), entry);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 对匹配的请求返回错误，`times` 为 None 时永远失败
    pub fn fail(self, path: &str, skip: Option<u64>, times: Option<usize>, error: DeliveryError) -> Self {
        self.push_failure(path, skip.map(|s| ("skip", s.to_string())), times, error)
    }

    /// 只对条目的指定版本返回错误
    pub fn fail_version(self, path: &str, version: u64, times: Option<usize>, error: DeliveryError) -> Self {
        self.push_failure(path, Some(("version", version.to_string())), times, error)
    }

    fn push_failure(
        self,
        path: &str,
        param: Option<(&'static str, String)>,
        times: Option<usize>,
        error: DeliveryError,
    ) -> Self {
        self.failures.lock().push(Failure {
            path: path.to_string(),
            param,
            remaining: times,
            error,
        });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// 指定条目版本的预置内容
    pub fn stored_version(&self, entry_uid: &str, locale: &str, version: u64) -> Option<Value> {
        self.versions
            .get(&(entry_uid.to_string(), locale.to_string(), version))
            .cloned()
    }

    fn injected_failure(&self, request: &RecordedRequest) -> Option<DeliveryError> {
        let mut failures = self.failures.lock();
        for failure in failures.iter_mut() {
            if failure.path != request.path {
                continue;
            }
            if let Some((name, value)) = &failure.param {
                if request.param(name) != Some(value.as_str()) {
                    continue;
                }
            }
            match failure.remaining.as_mut() {
                None => return Some(failure.error.clone()),
                Some(0) => continue,
                Some(n) => {
                    *n -= 1;
                    return Some(failure.error.clone());
                }
            }
        }
        None
    }

    fn page(items: &[Value], request: &RecordedRequest) -> Vec<Value> {
        let skip: usize = request.param("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
        let limit: usize = request
            .param("limit")
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);
        items.iter().skip(skip).take(limit).cloned().collect()
    }

    fn respond(&self, request: &RecordedRequest) -> Result<Value, DeliveryError> {
        if let Some(error) = self.injected_failure(request) {
            return Err(error);
        }

        let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["v3", "content_types"] => Ok(json!({
                "content_types": Self::page(&self.content_types, request),
                "count": self.content_types.len(),
            })),
            ["v3", "locales"] => Ok(json!({
                "locales": self.locales.iter().map(|c| json!({ "code": c })).collect::<Vec<_>>(),
            })),
            ["v3", "content_types", ct, "entries"] => {
                let locale = request.param("locale").unwrap_or_default().to_string();
                let key = (ct.to_string(), locale);
                let entries = self.entries.get(&key).cloned().unwrap_or_default();
                let total = self
                    .reported_totals
                    .get(&key)
                    .copied()
                    .unwrap_or(entries.len() as u64);
                Ok(json!({
                    "entries": Self::page(&entries, request),
                    "count": total,
                }))
            }
            ["v3", "content_types", _, "entries", uid] => {
                let locale = request.param("locale").unwrap_or_default().to_string();
                let version: u64 = request
                    .param("version")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                self.versions
                    .get(&(uid.to_string(), locale, version))
                    .map(|entry| json!({ "entry": entry }))
                    .ok_or_else(|| DeliveryError::NotFound(request.path.clone()))
            }
            _ => Err(DeliveryError::NotFound(request.path.clone())),
        }
    }
}

#[async_trait]
impl DeliveryApi for FakeDelivery {
    async fn request(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, DeliveryError> {
        let request = RecordedRequest {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        self.requests.lock().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let response = self.respond(&request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response
    }
}

/// 带一个顶层 JSON RTE 字段 `body` 的内容类型
pub fn rte_content_type(uid: &str) -> Value {
    json!({
        "uid": uid,
        "title": uid,
        "schema": [
            { "uid": "title", "data_type": "text" },
            {
                "uid": "body",
                "data_type": "json",
                "field_metadata": { "allow_json_rte": true }
            }
        ]
    })
}

/// 没有富文本字段的内容类型
pub fn plain_content_type(uid: &str) -> Value {
    json!({
        "uid": uid,
        "schema": [{ "uid": "title", "data_type": "text" }]
    })
}

/// 条目负载，`body` 为 None 时字段值为 null
pub fn entry(uid: &str, locale: &str, version: u64, body: Option<Value>) -> Value {
    json!({
        "uid": uid,
        "locale": locale,
        "_version": version,
        "title": uid,
        "body": body.unwrap_or(Value::Null),
    })
}

/// 正常的富文本内容
pub fn doc() -> Option<Value> {
    Some(json!({ "type": "doc", "children": [{ "type": "p", "children": [{ "text": "hi" }] }] }))
}

/// `count` 条编号连续的正常条目
pub fn clean_entries(prefix: &str, locale: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| entry(&format!("{}{:03}", prefix, i), locale, 1, doc()))
        .collect()
}

pub fn rate_limited() -> DeliveryError {
    DeliveryError::RateLimited {
        retry_after: Some(Duration::from_millis(5)),
    }
}
