//! Prometheus text format parser
//!
//! This crate turns the text served by a Prometheus `/metrics` endpoint into
//! typed metric families, in the order each family first appears in the
//! payload. Counter, gauge and untyped samples map one line to one
//! [`Metric`]. Summary and histogram families are folded down to one
//! [`Metric`] per label set carrying the `_sum` and `_count` series; quantile
//! and bucket lines are recognized but their values are not retained.
//!
//! <https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md>

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

use std::str::FromStr;

use rustc_hash::FxHashMap;

/// Type alias for label pairs
pub type LabelPairs = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Prometheus metric types
pub enum MetricType {
    /// A cumulative metric that represents a single monotonically increasing counter
    Counter,
    /// A single numerical value that can arbitrarily go up and down
    Gauge,
    /// Samples observations and counts them in configurable buckets
    Histogram,
    /// Samples observations into quantiles
    Summary,
    /// For compatibility with systems that don't have typed metrics
    Untyped,
}

impl FromStr for MetricType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            "summary" => Ok(Self::Summary),
            "untyped" => Ok(Self::Untyped),
            _ => Err(ParseError::UnknownMetricType(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur while parsing a single line
pub enum ParseError {
    /// Unknown metric type in TYPE line
    #[error("unknown metric type: {0}")]
    UnknownMetricType(String),
    /// Invalid format in the line
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// Invalid value that cannot be parsed as a number
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Missing value in metric line
    #[error("missing value")]
    MissingValue,
    /// Missing name in metric line
    #[error("missing metric name")]
    MissingName,
    /// Invalid label format
    #[error("invalid label: {0}")]
    InvalidLabel(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {source}")]
/// A payload could not be parsed. The whole payload is rejected.
pub struct Error {
    /// One-based line number of the offending line
    pub line: usize,
    /// What was wrong with it
    pub source: ParseError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// The value of one metric instance, shaped by its family's type
pub enum Value {
    /// Counter value
    Counter(f64),
    /// Gauge value
    Gauge(f64),
    /// Untyped value
    Untyped(f64),
    /// Summary aggregate, quantiles are dropped
    Summary {
        /// Value of the `_sum` series
        sum: f64,
        /// Value of the `_count` series
        count: f64,
    },
    /// Histogram aggregate, buckets are dropped
    Histogram {
        /// Value of the `_sum` series
        sum: f64,
        /// Value of the `_count` series
        count: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// One instance of a metric family at a particular label set
pub struct Metric {
    /// Label pairs in exposition order
    pub labels: LabelPairs,
    /// The instance value
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
/// A named group of same-typed metric instances
pub struct MetricFamily {
    /// Family name, without `_sum`/`_count`/`_bucket` suffixes
    pub name: String,
    /// Declared type, `Untyped` when no TYPE line was seen
    pub metric_type: MetricType,
    /// Instances in order of appearance
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq)]
/// A single sample line
pub struct Sample {
    /// The metric name as written on the line
    pub name: String,
    /// The metric labels as key-value pairs
    pub labels: LabelPairs,
    /// The sample value
    pub value: f64,
    /// Optional timestamp in milliseconds since Unix epoch
    pub timestamp: Option<i64>,
}

/// Where a sample line lands inside its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Value,
    Sum,
    Count,
    Bucket,
    Quantile,
}

#[derive(Debug, Clone)]
struct Member {
    family: String,
    metric_type: MetricType,
    role: Role,
}

/// Parse a complete Prometheus text format payload into metric families.
///
/// # Errors
///
/// Returns an error naming the first line that could not be parsed.
pub fn parse(text: &str) -> Result<Vec<MetricFamily>, Error> {
    let mut parser = Parser::new();
    for (idx, line) in text.lines().enumerate() {
        parser
            .feed(line)
            .map_err(|source| Error { line: idx + 1, source })?;
    }
    Ok(parser.finish())
}

#[derive(Debug, Default)]
/// Incremental parser for Prometheus text exposition format
///
/// Lines are fed one at a time. TYPE declarations are remembered so that
/// later sample lines can be attributed to their family.
pub struct Parser {
    typemap: FxHashMap<String, Member>,
    families: Vec<MetricFamily>,
    family_index: FxHashMap<String, usize>,
    aggregate_index: FxHashMap<(usize, LabelPairs), usize>,
}

impl Parser {
    /// Create a new parser instance
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a single line of Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if the line is a malformed TYPE declaration or a
    /// malformed sample.
    pub fn feed(&mut self, line: &str) -> Result<(), ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(comment) = line.strip_prefix('#') {
            let mut parts = comment.split_ascii_whitespace();
            if parts.next() == Some("TYPE") {
                let name = parts.next().ok_or_else(|| {
                    ParseError::InvalidFormat("Missing metric name in TYPE line".to_string())
                })?;
                let metric_type: MetricType = parts
                    .next()
                    .ok_or_else(|| {
                        ParseError::InvalidFormat("Missing metric type in TYPE line".to_string())
                    })?
                    .parse()?;
                self.declare(name, metric_type);
            }
            // HELP and free-form comments carry nothing we keep.
            return Ok(());
        }

        let sample = parse_sample(line)?;
        self.record(sample);
        Ok(())
    }

    /// Consume the parser, yielding families in order of first appearance.
    #[must_use]
    pub fn finish(self) -> Vec<MetricFamily> {
        self.families
    }

    fn declare(&mut self, name: &str, metric_type: MetricType) {
        let mut insert = |series: String, role: Role| {
            self.typemap.insert(
                series,
                Member {
                    family: name.to_owned(),
                    metric_type,
                    role,
                },
            );
        };

        match metric_type {
            MetricType::Histogram => {
                insert(format!("{name}_sum"), Role::Sum);
                insert(format!("{name}_count"), Role::Count);
                insert(format!("{name}_bucket"), Role::Bucket);
            }
            MetricType::Summary => {
                insert(format!("{name}_sum"), Role::Sum);
                insert(format!("{name}_count"), Role::Count);
                insert(name.to_owned(), Role::Quantile);
            }
            MetricType::Counter | MetricType::Gauge | MetricType::Untyped => {
                insert(name.to_owned(), Role::Value);
            }
        }
    }

    fn record(&mut self, sample: Sample) {
        let (family, declared, role) = match self.typemap.get(&sample.name) {
            Some(member) => (member.family.clone(), member.metric_type, member.role),
            None => (sample.name.clone(), MetricType::Untyped, Role::Value),
        };
        let (family_idx, metric_type) = self.family_slot(family, declared);

        let role = match (role, metric_type) {
            // A bare sample landing in an aggregate family only marks the
            // label set as present.
            (Role::Value, MetricType::Histogram | MetricType::Summary) => Role::Quantile,
            (role, _) => role,
        };

        if role == Role::Value {
            let value = match metric_type {
                MetricType::Counter => Value::Counter(sample.value),
                MetricType::Gauge => Value::Gauge(sample.value),
                MetricType::Untyped | MetricType::Histogram | MetricType::Summary => {
                    Value::Untyped(sample.value)
                }
            };
            self.families[family_idx].metrics.push(Metric {
                labels: sample.labels,
                value,
            });
            return;
        }

        let mut labels = sample.labels;
        labels.retain(|(name, _)| name != "le" && name != "quantile");
        let slot = self.aggregate_slot(family_idx, metric_type, labels);
        if let Value::Summary { sum, count } | Value::Histogram { sum, count } =
            &mut self.families[family_idx].metrics[slot].value
        {
            match role {
                Role::Sum => *sum = sample.value,
                Role::Count => *count = sample.value,
                Role::Value | Role::Bucket | Role::Quantile => {}
            }
        }
    }

    /// Index of the family named `name`, creating it with `metric_type` if
    /// absent. The type of an existing family wins.
    fn family_slot(&mut self, name: String, metric_type: MetricType) -> (usize, MetricType) {
        if let Some(&idx) = self.family_index.get(&name) {
            return (idx, self.families[idx].metric_type);
        }
        let idx = self.families.len();
        self.family_index.insert(name.clone(), idx);
        self.families.push(MetricFamily {
            name,
            metric_type,
            metrics: Vec::new(),
        });
        (idx, metric_type)
    }

    fn aggregate_slot(
        &mut self,
        family_idx: usize,
        metric_type: MetricType,
        mut labels: LabelPairs,
    ) -> usize {
        labels.sort();
        let key = (family_idx, labels);
        if let Some(&slot) = self.aggregate_index.get(&key) {
            return slot;
        }

        let value = if metric_type == MetricType::Histogram {
            Value::Histogram {
                sum: 0.0,
                count: 0.0,
            }
        } else {
            Value::Summary {
                sum: 0.0,
                count: 0.0,
            }
        };
        let metrics = &mut self.families[family_idx].metrics;
        let slot = metrics.len();
        metrics.push(Metric {
            labels: key.1.clone(),
            value,
        });
        self.aggregate_index.insert(key, slot);
        slot
    }
}

/// Parse one sample line: `name{label="value",...} value [timestamp]`.
///
/// # Errors
///
/// Returns an error if the line has no name, malformed labels or an
/// unparseable value or timestamp.
pub fn parse_sample(line: &str) -> Result<Sample, ParseError> {
    let line = line.trim();
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .ok_or(ParseError::MissingValue)?;
    let (name, rest) = line.split_at(name_end);
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let (labels, rest) = match rest.strip_prefix('{') {
        Some(body) => parse_labels(body)?,
        None => (Vec::new(), rest),
    };
    let (value, timestamp) = parse_value_and_timestamp(rest)?;

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
        timestamp,
    })
}

/// Parse the label body following `{`, returning the pairs and whatever
/// follows the closing `}`.
fn parse_labels(input: &str) -> Result<(LabelPairs, &str), ParseError> {
    let mut labels = Vec::new();
    let mut rest = input.trim_start();

    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let (label_name, after_name) = rest
            .split_once('=')
            .ok_or_else(|| ParseError::InvalidLabel(format!("Label missing '=': {rest}")))?;
        let label_name = label_name.trim();
        if label_name.is_empty() {
            return Err(ParseError::InvalidLabel("Empty label key".to_string()));
        }
        if label_name.contains(['{', '}', ',', '"']) || label_name.contains(char::is_whitespace)
        {
            return Err(ParseError::InvalidLabel(format!(
                "Invalid label name: {label_name}"
            )));
        }

        let (label_value, after_value) = parse_label_value(after_name.trim_start())?;
        labels.push((label_name.to_string(), label_value));

        rest = after_value.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else if !rest.starts_with('}') {
            return Err(ParseError::InvalidLabel(
                "Expected ',' or '}' after label value".to_string(),
            ));
        }
    }
}

/// Parse a quoted label value with escapes, returning the unescaped value and
/// the text after the closing quote.
fn parse_label_value(input: &str) -> Result<(String, &str), ParseError> {
    let inner = input
        .strip_prefix('"')
        .ok_or_else(|| ParseError::InvalidLabel("Label value must be quoted".to_string()))?;

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, 'n')) => result.push('\n'),
                Some((_, c)) => {
                    return Err(ParseError::InvalidLabel(format!(
                        "Invalid escape sequence: \\{c}"
                    )));
                }
                None => {
                    return Err(ParseError::InvalidLabel(
                        "Backslash at end of label value".to_string(),
                    ));
                }
            },
            '"' => return Ok((result, &inner[idx + 1..])),
            c => result.push(c),
        }
    }

    Err(ParseError::InvalidLabel(
        "Unterminated label value".to_string(),
    ))
}

fn parse_value_and_timestamp(value_str: &str) -> Result<(f64, Option<i64>), ParseError> {
    let mut parts = value_str.split_whitespace();

    let value_part = parts.next().ok_or(ParseError::MissingValue)?;

    if value_part.contains('#') {
        return Err(ParseError::InvalidFormat(
            "Value contains comment marker".to_string(),
        ));
    }

    let value = match value_part {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        _ => value_part
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidValue(value_part.to_string()))?,
    };

    let timestamp = match parts.next() {
        Some(ts_str) => Some(
            ts_str
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidFormat(format!("Invalid timestamp: {ts_str}")))?,
        ),
        None => None,
    };

    if let Some(extra) = parts.next() {
        return Err(ParseError::InvalidFormat(format!(
            "Unexpected trailing token: {extra}"
        )));
    }

    Ok((value, timestamp))
}

#[allow(clippy::needless_raw_string_hashes)]
#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(raw: &[(&str, &str)]) -> LabelPairs {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn sample_no_labels() {
        let sample = parse_sample("http_requests_total 1027").unwrap();
        assert_eq!(sample.name, "http_requests_total");
        assert_eq!(sample.value, 1027.0);
        assert!(sample.labels.is_empty());
        assert_eq!(sample.timestamp, None);
    }

    #[test]
    fn sample_with_labels_and_timestamp() {
        let sample =
            parse_sample(r#"http_requests_total{method="GET",code="200"} 1027 1395066363000"#)
                .unwrap();
        assert_eq!(sample.name, "http_requests_total");
        assert_eq!(sample.value, 1027.0);
        assert_eq!(sample.labels, pairs(&[("method", "GET"), ("code", "200")]));
        assert_eq!(sample.timestamp, Some(1_395_066_363_000));
    }

    #[test]
    fn label_values_may_hold_separators() {
        let sample =
            parse_sample(r#"build_info{revision="745babd, 2024-09-11 {x}",arch="aarch64"} 1"#)
                .unwrap();
        assert_eq!(
            sample.labels,
            pairs(&[("revision", "745babd, 2024-09-11 {x}"), ("arch", "aarch64")])
        );
    }

    #[test]
    fn trailing_comma_in_labels() {
        let sample = parse_sample(r#"metric{a="1",} 2"#).unwrap();
        assert_eq!(sample.labels, pairs(&[("a", "1")]));
    }

    #[test]
    fn empty_label_body() {
        let sample = parse_sample("metric{} 2").unwrap();
        assert!(sample.labels.is_empty());
        assert_eq!(sample.value, 2.0);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(matches!(
            parse_sample("http_requests_total foobar"),
            Err(ParseError::InvalidValue(_))
        ));
        assert!(matches!(parse_sample("{}0"), Err(ParseError::MissingName)));
        assert!(matches!(parse_sample("metric"), Err(ParseError::MissingValue)));
        assert!(matches!(
            parse_sample("metric{} "),
            Err(ParseError::MissingValue)
        ));
        assert!(matches!(
            parse_sample(r#"metric{="value"} 123"#),
            Err(ParseError::InvalidLabel(_))
        ));
        assert!(matches!(
            parse_sample("metric{key} 123"),
            Err(ParseError::InvalidLabel(_))
        ));
        assert!(matches!(
            parse_sample("metric{key=unquoted} 123"),
            Err(ParseError::InvalidLabel(_))
        ));
        assert!(matches!(
            parse_sample(r#"metric{key="} 123"#),
            Err(ParseError::InvalidLabel(_))
        ));
        assert!(matches!(
            parse_sample(r#"metric{key="a" other="b"} 123"#),
            Err(ParseError::InvalidLabel(_))
        ));
        assert!(matches!(
            parse_sample("metric 1 2 3"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn label_value_escaping() {
        let sample = parse_sample(r#"metric{key="value with \"quotes\""} 123"#).unwrap();
        assert_eq!(sample.labels[0].1, "value with \"quotes\"");

        let sample = parse_sample(r#"metric{key="path\\to\\file"} 123"#).unwrap();
        assert_eq!(sample.labels[0].1, "path\\to\\file");

        let sample = parse_sample(r#"metric{key="line1\nline2"} 123"#).unwrap();
        assert_eq!(sample.labels[0].1, "line1\nline2");

        assert!(matches!(
            parse_sample(r#"metric{key="invalid\x"} 123"#),
            Err(ParseError::InvalidLabel(_))
        ));
    }

    #[test]
    fn special_float_values() {
        assert!(parse_sample("metric NaN").unwrap().value.is_nan());
        assert_eq!(parse_sample("metric +Inf").unwrap().value, f64::INFINITY);
        assert_eq!(
            parse_sample("metric -Inf").unwrap().value,
            f64::NEG_INFINITY
        );
        assert_eq!(parse_sample("metric 1.23e45").unwrap().value, 1.23e45);
        assert_eq!(parse_sample("metric -42.5").unwrap().value, -42.5);
    }

    #[test]
    fn counters_and_gauges_group_into_families() {
        let text = r#"
# HELP http_requests_total The total number of HTTP requests.
# TYPE http_requests_total counter
http_requests_total{method="post",code="200"} 1027 1395066363000
http_requests_total{method="post",code="400"}    3 1395066363000

# TYPE memory_usage gauge
memory_usage 5264384
"#;

        let families = parse(text).unwrap();
        assert_eq!(families.len(), 2);

        assert_eq!(families[0].name, "http_requests_total");
        assert_eq!(families[0].metric_type, MetricType::Counter);
        assert_eq!(families[0].metrics.len(), 2);
        assert_eq!(families[0].metrics[0].value, Value::Counter(1027.0));
        assert_eq!(families[0].metrics[1].value, Value::Counter(3.0));
        assert_eq!(
            families[0].metrics[1].labels,
            pairs(&[("method", "post"), ("code", "400")])
        );

        assert_eq!(families[1].name, "memory_usage");
        assert_eq!(families[1].metric_type, MetricType::Gauge);
        assert_eq!(families[1].metrics, vec![Metric {
            labels: Vec::new(),
            value: Value::Gauge(5_264_384.0),
        }]);
    }

    #[test]
    fn undeclared_samples_are_untyped() {
        let families = parse("some_metric 4\nsome_metric{a=\"b\"} 5\n").unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].metric_type, MetricType::Untyped);
        assert_eq!(families[0].metrics.len(), 2);
        assert_eq!(families[0].metrics[1].value, Value::Untyped(5.0));
    }

    #[test]
    fn histogram_folds_to_sum_and_count() {
        let text = r#"
# TYPE http_request_duration_seconds histogram
http_request_duration_seconds_bucket{path="/a",le="0.05"} 24054
http_request_duration_seconds_bucket{path="/a",le="+Inf"} 144320
http_request_duration_seconds_sum{path="/a"} 53423
http_request_duration_seconds_count{path="/a"} 144320
http_request_duration_seconds_bucket{le="+Inf",path="/b"} 7
http_request_duration_seconds_count{path="/b"} 7
http_request_duration_seconds_sum{path="/b"} 1.5
"#;
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.name, "http_request_duration_seconds");
        assert_eq!(family.metric_type, MetricType::Histogram);
        assert_eq!(family.metrics.len(), 2);
        assert_eq!(family.metrics[0].labels, pairs(&[("path", "/a")]));
        assert_eq!(family.metrics[0].value, Value::Histogram {
            sum: 53423.0,
            count: 144_320.0,
        });
        assert_eq!(family.metrics[1].value, Value::Histogram {
            sum: 1.5,
            count: 7.0,
        });
    }

    #[test]
    fn summary_folds_to_sum_and_count() {
        let text = r#"
# TYPE rpc_duration_seconds summary
rpc_duration_seconds{quantile="0.5"} 4773
rpc_duration_seconds{quantile="0.99"} 76656
rpc_duration_seconds_sum 1.7560473e+07
rpc_duration_seconds_count 2693
"#;
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].metric_type, MetricType::Summary);
        assert_eq!(families[0].metrics, vec![Metric {
            labels: Vec::new(),
            value: Value::Summary {
                sum: 1.756_047_3e7,
                count: 2693.0,
            },
        }]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse("ok_metric 1\n# TYPE x bogus\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.source,
            ParseError::UnknownMetricType("bogus".to_string())
        );

        let err = parse("\n\nbad_metric{a=\"b\" 1\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.source, ParseError::InvalidLabel(_)));
    }

    proptest! {
        #[test]
        fn prop_no_panic_on_any_input(input: String) {
            let _ = parse(&input);
        }

        #[test]
        fn prop_valid_metric_names_accepted(
            name in "[a-zA-Z_:][a-zA-Z0-9_:]*",
            value in prop::num::f64::NORMAL | prop::num::f64::POSITIVE | prop::num::f64::NEGATIVE,
        ) {
            let line = format!("{name} {value}");
            let sample = parse_sample(&line);
            prop_assert!(sample.is_ok());
            let sample = sample.unwrap();
            prop_assert_eq!(sample.name, name);
            prop_assert_eq!(sample.value, value);
        }

        #[test]
        fn prop_label_escaping_roundtrip(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            label_name in "[a-zA-Z_][a-zA-Z0-9_]*",
            raw_value in ".*",
            metric_value in "[0-9]+",
        ) {
            let escaped = raw_value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");

            let line = format!("{name}{{{label_name}=\"{escaped}\"}} {metric_value}");
            let sample = parse_sample(&line).unwrap();
            prop_assert_eq!(&sample.labels[0].0, &label_name);
            prop_assert_eq!(&sample.labels[0].1, &raw_value);
        }

        #[test]
        fn prop_timestamp_parsing(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            value in prop::num::f64::NORMAL,
            timestamp in prop::num::i64::ANY,
        ) {
            let line = format!("{name} {value} {timestamp}");
            let sample = parse_sample(&line);
            prop_assert!(sample.is_ok());
            prop_assert_eq!(sample.unwrap().timestamp, Some(timestamp));
        }
    }
}
