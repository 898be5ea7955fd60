//! Raw samples as consumed by the reconciliation engine.
//!
//! A scrape produces metric families. Every family instance becomes one
//! [`RawSample`] carrying a single representative scalar, see [`scalar`].

use met_exposition::MetricFamily;
use tracing::warn;

pub use met_exposition::{LabelPairs, MetricType as MetricKind, Value as Measurement};

/// Representative scalar of a measurement.
///
/// Counters, gauges and untyped metrics report their value directly.
/// Summaries and histograms report their aggregate sum.
#[must_use]
pub fn scalar(measurement: &Measurement) -> f64 {
    match *measurement {
        Measurement::Counter(value) | Measurement::Gauge(value) | Measurement::Untyped(value) => {
            value
        }
        Measurement::Summary { sum, .. } | Measurement::Histogram { sum, .. } => sum,
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One observation of one series in one scrape
pub struct RawSample {
    /// Metric family name
    pub name: String,
    /// Kind of the family this sample came from
    pub kind: MetricKind,
    /// Labels in whatever order the endpoint produced them
    pub labels: LabelPairs,
    /// The representative scalar
    pub value: f64,
}

impl RawSample {
    /// Build a sample from borrowed parts.
    #[must_use]
    pub fn new(name: &str, kind: MetricKind, labels: &[(&str, &str)], value: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            value,
        }
    }

    /// Whether this sample belongs to a counter family.
    #[must_use]
    pub fn is_counter(&self) -> bool {
        self.kind == MetricKind::Counter
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// All samples observed by one successful scrape
pub struct Batch {
    samples: Vec<RawSample>,
}

impl Batch {
    /// Flatten parsed families into a batch.
    ///
    /// Samples whose scalar is not finite are dropped here; everything that
    /// reaches reconciliation is a finite number.
    #[must_use]
    pub fn from_families(families: Vec<MetricFamily>) -> Self {
        let mut samples = Vec::with_capacity(families.iter().map(|f| f.metrics.len()).sum());
        for family in families {
            for metric in family.metrics {
                let value = scalar(&metric.value);
                if !value.is_finite() {
                    let name = &family.name;
                    warn!("Skipping non-finite value {value} for {name}");
                    continue;
                }
                samples.push(RawSample {
                    name: family.name.clone(),
                    kind: family.metric_type,
                    labels: metric.labels,
                    value,
                });
            }
        }
        Self { samples }
    }

    /// The samples, in scrape order.
    #[must_use]
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    /// Number of samples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the batch holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<RawSample> for Batch {
    fn from_iter<I: IntoIterator<Item = RawSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
