//! Progress events derived from command output.

/// One update for a progress renderer.
///
/// `percent` is always within `0.0..=100.0` when present. An event with
/// only a message means "still alive, no quantitative estimate".
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    percent: Option<f64>,
    message: Option<String>,
}

impl ProgressEvent {
    /// A quantitative event; the percentage is clamped into range.
    pub fn at(percent: f64, message: impl Into<String>) -> Self {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        Self {
            percent: Some(percent),
            message: Some(message.into()),
        }
    }

    /// A message-only event.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            percent: None,
            message: Some(message.into()),
        }
    }

    /// Completion percentage, if known.
    pub fn percent(&self) -> Option<f64> {
        self.percent
    }

    /// Human-readable status.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether this event carries a percentage.
    pub fn is_quantitative(&self) -> bool {
        self.percent.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped() {
        assert_eq!(ProgressEvent::at(150.0, "x").percent(), Some(100.0));
        assert_eq!(ProgressEvent::at(-3.0, "x").percent(), Some(0.0));
        assert_eq!(ProgressEvent::at(f64::NAN, "x").percent(), Some(0.0));
        assert_eq!(ProgressEvent::at(42.5, "x").percent(), Some(42.5));
    }

    #[test]
    fn message_only_has_no_percent() {
        let event = ProgressEvent::message_only("still working");
        assert!(!event.is_quantitative());
        assert_eq!(event.message(), Some("still working"));
    }
}
