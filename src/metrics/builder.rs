use std::fmt;

/// Measurement name used as the line-protocol table for every line.
const MEASUREMENT_TABLE: &str = "request";

// ─── Values ──────────────────────────────────────────────────────

/// Numeric payload of one measurement, carrying its rendering rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(i64),
    /// Shortest round-trip decimal (`25`, `0.0002`, `7.000000000000001`)
    Float(f64),
    /// Always rendered with exactly two decimals (`50.00`)
    Fixed2(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Fixed2(v) => write!(f, "{v:.2}"),
        }
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

// ─── Builder ─────────────────────────────────────────────────────

/// Accumulates one flush cycle's measurements as wire-ready lines:
///
/// ```text
/// request,source=<src>[,k=v...] <name>=<value>
/// ```
///
/// Label keys and values are written verbatim; callers must keep `,`
/// ` ` and `=` out of them.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    source: String,
    lines: Vec<String>,
}

impl SeriesBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lines: Vec::new(),
        }
    }

    /// Appends one formatted line. Labels keep the order given.
    pub fn add_measurement(
        &mut self,
        name: &str,
        labels: &[(&str, &str)],
        value: impl Into<MetricValue>,
    ) {
        let mut line = format!("{MEASUREMENT_TABLE},source={}", self.source);
        for (key, val) in labels {
            line.push(',');
            line.push_str(key);
            line.push('=');
            line.push_str(val);
        }
        line.push(' ');
        line.push_str(name);
        line.push('=');
        line.push_str(&value.into().to_string());

        self.lines.push(line);
    }

    /// Joins every accumulated line with `separator`.
    pub fn serialize(&self, separator: &str) -> String {
        self.lines.join(separator)
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
