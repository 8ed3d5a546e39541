//! Fixed-record fallback strategy.

use async_trait::async_trait;

use super::AcquisitionStrategy;
use crate::Result;

/// Strategy that always returns a caller-supplied record.
///
/// The cheap last-resort tail of a chain: when every real strategy has
/// failed, callers that prefer a placeholder over an exhaustion error
/// append one of these. Also the natural test double.
pub struct FixedStrategy<T> {
    value: T,
    label: String,
    confidence: f32,
}

impl<T> FixedStrategy<T> {
    /// Create a strategy that always yields `value`.
    pub fn new(value: T) -> Self {
        Self {
            value,
            label: "fixed".to_string(),
            confidence: 0.1,
        }
    }

    /// Override the source label (default: `"fixed"`).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Override the static confidence (default: 0.1).
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

#[async_trait]
impl<T> AcquisitionStrategy<T> for FixedStrategy<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn source(&self) -> &str {
        &self.label
    }

    fn confidence(&self) -> Option<f32> {
        Some(self.confidence)
    }

    async fn attempt(&self, _identifier: &str) -> Result<T> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds_with_the_fixed_value() {
        let strategy = FixedStrategy::new(42).label("placeholder").confidence(0.2);
        assert_eq!(strategy.source(), "placeholder");
        assert_eq!(AcquisitionStrategy::confidence(&strategy), Some(0.2));
        assert_eq!(strategy.attempt("anyone").await.unwrap(), 42);
    }
}
