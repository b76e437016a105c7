use crate::types::{Properties, TrackingEvent};
use serde_json::Value;

/// Builder for structured [`TrackingEvent`]s.
///
/// ```
/// use metametrics::EventBuilder;
///
/// let event = EventBuilder::new("Browser Search Used")
///     .add_property("option_chosen", "Bottom Bar Menu")
///     .add_sensitive_property("search_terms", "example")
///     .build();
/// assert!(event.is_anonymous());
/// ```
#[derive(Clone, Debug)]
pub struct EventBuilder {
    name: String,
    properties: Properties,
    sensitive_properties: Properties,
    save_data_recording: bool,
}

impl EventBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            sensitive_properties: Properties::new(),
            save_data_recording: true,
        }
    }

    /// Merge non-sensitive properties into the event.
    pub fn add_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn add_property<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge sensitive properties into the event. A non-empty sensitive set
    /// makes the tracker dispatch an anonymous twin event.
    pub fn add_sensitive_properties(mut self, properties: Properties) -> Self {
        self.sensitive_properties.extend(properties);
        self
    }

    pub fn add_sensitive_property<K: Into<String>, V: Into<Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.sensitive_properties.insert(key.into(), value.into());
        self
    }

    /// Opt this event out of updating the data-recorded flag.
    pub fn save_data_recording(mut self, save: bool) -> Self {
        self.save_data_recording = save;
        self
    }

    pub fn build(self) -> TrackingEvent {
        TrackingEvent::Structured {
            name: self.name,
            properties: self.properties,
            sensitive_properties: self.sensitive_properties,
            save_data_recording: self.save_data_recording,
        }
    }
}
