//! Prometheus endpoint scraper
//!
//! This module fetches Prometheus/OpenMetrics text from the target endpoint
//! and hands back a [`Batch`]. A scrape never touches viewer state; its
//! outcome is delivered to the state machine as an event.
//!

use std::time::Duration;

use tracing::{debug, trace};

use crate::sample::Batch;

#[derive(thiserror::Error, Debug)]
/// Errors produced by [`Scraper`]
pub enum Error {
    /// Endpoint unreachable or the request timed out
    #[error("Failed to get {uri}: {source}")]
    Transport {
        /// Endpoint URI
        uri: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
    /// Endpoint answered with a non-success status
    #[error("Got status {status} from {uri}")]
    Status {
        /// Endpoint URI
        uri: String,
        /// HTTP status code
        status: u16,
    },
    /// Response body could not be read
    #[error("Failed to read response from {uri}: {source}")]
    Body {
        /// Endpoint URI
        uri: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
    /// Response body is not valid exposition format
    #[error("Malformed metrics from {uri}: {source}")]
    Malformed {
        /// Endpoint URI
        uri: String,
        /// Parser error
        #[source]
        source: met_exposition::Error,
    },
}

/// Fetches one endpoint. Cheap to clone; clones share the HTTP client.
#[derive(Debug, Clone)]
pub struct Scraper {
    client: reqwest::Client,
    uri: String,
    timeout: Duration,
}

impl Scraper {
    /// Create a new [`Scraper`] instance
    ///
    /// Every request made by this scraper is abandoned after `timeout`.
    #[must_use]
    pub fn new(uri: String, timeout: Duration) -> Self {
        let client = reqwest::Client::new();
        Self {
            client,
            uri,
            timeout,
        }
    }

    /// The endpoint this scraper polls.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Scrape the endpoint once.
    ///
    /// # Errors
    ///
    /// Function will return an error if the endpoint cannot be reached in
    /// time, answers with a non-success status, or serves a payload that is
    /// not valid exposition format.
    pub async fn scrape(&self) -> Result<Batch, Error> {
        let resp = self
            .client
            .get(&self.uri)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| Error::Transport {
                uri: self.uri.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                uri: self.uri.clone(),
                status: status.as_u16(),
            });
        }

        let text = resp.text().await.map_err(|source| Error::Body {
            uri: self.uri.clone(),
            source,
        })?;
        trace!(bytes = text.len(), "read metrics payload");

        let families = met_exposition::parse(&text).map_err(|source| Error::Malformed {
            uri: self.uri.clone(),
            source,
        })?;
        let batch = Batch::from_families(families);
        debug!(samples = batch.len(), uri = %self.uri, "scrape complete");
        Ok(batch)
    }
}

#[allow(clippy::needless_raw_string_hashes)]
#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MetricKind, RawSample};
    use warp::Filter;

    const COUNTER_AND_GAUGE: &str = r#"
    # HELP requests_total Requests served.
    # TYPE requests_total counter
    requests_total{path="a",code="200"} 100
    requests_total{path="b",code="200"} 3
    # TYPE memory_usage_bytes gauge
    memory_usage_bytes{process="test"} 5264384
    "#;

    const HISTOGRAM: &str = r#"
    # TYPE latency_seconds histogram
    latency_seconds_bucket{le="0.1"} 3
    latency_seconds_bucket{le="+Inf"} 4
    latency_seconds_sum 0.75
    latency_seconds_count 4
    "#;

    const INVALID_VALUE: &str = r#"
    # TYPE memory_usage_bytes gauge
    memory_usage_bytes{process="test"} foobar
    "#;

    fn serve(body: &'static str, status: warp::http::StatusCode) -> String {
        let server = warp::serve(
            warp::path("metrics").map(move || warp::reply::with_status(body, status)),
        );
        let (addr, serve_fut) = server.bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serve_fut);
        format!("http://{addr}/metrics")
    }

    #[tokio::test]
    async fn scrape_counters_and_gauges() {
        let uri = serve(COUNTER_AND_GAUGE, warp::http::StatusCode::OK);
        let scraper = Scraper::new(uri, Duration::from_secs(5));

        let batch = scraper.scrape().await.expect("scrape failed");
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.samples()[0],
            RawSample::new(
                "requests_total",
                MetricKind::Counter,
                &[("path", "a"), ("code", "200")],
                100.0
            )
        );
        assert_eq!(
            batch.samples()[2],
            RawSample::new(
                "memory_usage_bytes",
                MetricKind::Gauge,
                &[("process", "test")],
                5_264_384.0
            )
        );
    }

    #[tokio::test]
    async fn scrape_histogram_sum() {
        let uri = serve(HISTOGRAM, warp::http::StatusCode::OK);
        let scraper = Scraper::new(uri, Duration::from_secs(5));

        let batch = scraper.scrape().await.expect("scrape failed");
        assert_eq!(batch.samples(), &[RawSample::new(
            "latency_seconds",
            MetricKind::Histogram,
            &[],
            0.75
        )]);
    }

    #[tokio::test]
    async fn non_success_status() {
        let uri = serve("oops", warp::http::StatusCode::SERVICE_UNAVAILABLE);
        let scraper = Scraper::new(uri, Duration::from_secs(5));

        match scraper.scrape().await {
            Err(Error::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload() {
        let uri = serve(INVALID_VALUE, warp::http::StatusCode::OK);
        let scraper = Scraper::new(uri, Duration::from_secs(5));

        match scraper.scrape().await {
            Err(Error::Malformed { source, .. }) => assert_eq!(source.line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let route = warp::path("metrics").and_then(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, warp::Rejection>(COUNTER_AND_GAUGE)
        });
        let (addr, serve_fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serve_fut);

        let scraper = Scraper::new(
            format!("http://{addr}/metrics"),
            Duration::from_millis(100),
        );
        match scraper.scrape().await {
            Err(Error::Transport { source, .. }) => assert!(source.is_timeout()),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
