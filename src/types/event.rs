use crate::types::Properties;
use serde::{Deserialize, Serialize};

/// An analytics event in one of the two supported shapes.
///
/// Legacy call sites carry an event category and an optional flat property
/// map; the sensitive subset of a legacy map is derived at tracking time by
/// the configured partition policy. Structured events are typically produced
/// with [`EventBuilder`](crate::types::EventBuilder) and carry their
/// anonymous split explicitly.
///
/// Exactly one shape is active per event. Deserialization discriminates on
/// the fields present: a `category` field selects the legacy shape, a `name`
/// field the structured one.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackingEvent {
    Structured {
        name: String,
        #[serde(default)]
        properties: Properties,
        #[serde(default)]
        sensitive_properties: Properties,
        #[serde(default = "default_save_data_recording")]
        save_data_recording: bool,
    },
    Legacy {
        category: String,
        #[serde(default)]
        properties: Option<Properties>,
    },
}

fn default_save_data_recording() -> bool {
    true
}

impl TrackingEvent {
    /// A legacy event with no properties.
    pub fn legacy<S: Into<String>>(category: S) -> Self {
        TrackingEvent::Legacy {
            category: category.into(),
            properties: None,
        }
    }

    /// A legacy event carrying a flat property map.
    pub fn legacy_with_properties<S: Into<String>>(category: S, properties: Properties) -> Self {
        TrackingEvent::Legacy {
            category: category.into(),
            properties: Some(properties),
        }
    }

    /// The name the event is dispatched under (category for legacy events).
    pub fn name(&self) -> &str {
        match self {
            TrackingEvent::Structured { name, .. } => name,
            TrackingEvent::Legacy { category, .. } => category,
        }
    }

    /// Whether the event carries any properties, sensitive or not.
    pub fn has_properties(&self) -> bool {
        match self {
            TrackingEvent::Structured {
                properties,
                sensitive_properties,
                ..
            } => !properties.is_empty() || !sensitive_properties.is_empty(),
            TrackingEvent::Legacy { properties, .. } => {
                properties.as_ref().is_some_and(|p| !p.is_empty())
            }
        }
    }

    /// Whether an anonymous twin event will be dispatched.
    ///
    /// Derived for structured events; legacy events only become anonymous
    /// once the partition policy yields a sensitive bucket.
    pub fn is_anonymous(&self) -> bool {
        match self {
            TrackingEvent::Structured {
                sensitive_properties,
                ..
            } => !sensitive_properties.is_empty(),
            TrackingEvent::Legacy { .. } => false,
        }
    }

    /// Whether tracking this event should update the data-recorded flag.
    pub fn save_data_recording(&self) -> bool {
        match self {
            TrackingEvent::Structured {
                save_data_recording,
                ..
            } => *save_data_recording,
            TrackingEvent::Legacy { .. } => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn legacy_shape_discriminant() {
        let event: TrackingEvent =
            serde_json::from_value(json!({ "category": "Test", "properties": { "a": 1 } }))
                .unwrap();
        assert_eq!(
            event,
            TrackingEvent::legacy_with_properties("Test", props(json!({ "a": 1 })))
        );
        assert!(event.has_properties());
        assert!(!event.is_anonymous());
        assert!(event.save_data_recording());
    }

    #[test]
    fn structured_shape_discriminant() {
        let event: TrackingEvent = serde_json::from_value(json!({
            "name": "Gas Fees Changed",
            "sensitive_properties": { "amount": "0.1" }
        }))
        .unwrap();
        assert_eq!(event.name(), "Gas Fees Changed");
        assert!(event.has_properties());
        assert!(event.is_anonymous());
        assert!(event.save_data_recording());
    }

    #[test]
    fn bare_legacy_event_has_no_properties() {
        let event = TrackingEvent::legacy("Onboarding Started");
        assert!(!event.has_properties());
        assert!(!event.is_anonymous());
    }
}
