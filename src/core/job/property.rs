//! Declarative job properties
//!
//! A job is parameterized by named string properties. Each property carries a
//! description, a required flag, and a consumer that applies a raw value to
//! the job's state. Properties are applied in registration order so a later
//! consumer can rely on the effect of an earlier one.

use crate::core::dispatch::listener::panic_message;
use crate::domain::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Applies a raw property value to a job's state
pub type PropertyConsumer<S> = Box<dyn Fn(&mut S, &str) -> Result<()> + Send + Sync>;

/// Listing entry for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Whether the property must be supplied
    pub required: bool,
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "{} (required): {}", self.name, self.description)
        } else {
            write!(f, "{}: {}", self.name, self.description)
        }
    }
}

struct JobProperty<S> {
    descriptor: PropertyDescriptor,
    consumer: PropertyConsumer<S>,
}

/// Ordered set of properties for one job instance
pub struct JobPropertyRegistry<S> {
    properties: Vec<JobProperty<S>>,
}

impl<S> JobPropertyRegistry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    /// Register a property
    ///
    /// A name that is already registered is replaced in place: the new
    /// description, flag and consumer win and the listing position is kept.
    pub fn register<F>(&mut self, name: &str, description: &str, required: bool, consumer: F)
    where
        F: Fn(&mut S, &str) -> Result<()> + Send + Sync + 'static,
    {
        let property = JobProperty {
            descriptor: PropertyDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                required,
            },
            consumer: Box::new(consumer),
        };

        match self
            .properties
            .iter_mut()
            .find(|p| p.descriptor.name == name)
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Register an optional property
    pub fn add_property<F>(&mut self, name: &str, description: &str, consumer: F)
    where
        F: Fn(&mut S, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, description, false, consumer);
    }

    /// Register a required property
    pub fn add_required_property<F>(&mut self, name: &str, description: &str, consumer: F)
    where
        F: Fn(&mut S, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, description, true, consumer);
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<PropertyDescriptor> {
        self.properties.iter().map(|p| p.descriptor.clone()).collect()
    }

    /// Descriptor for a name
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .map(|p| &p.descriptor)
            .find(|d| d.name == name)
    }

    /// Number of registered properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no property is registered
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Apply property values to `target`
    ///
    /// Returns one message per missing required property and per rejected
    /// value; an empty list means every property was accepted. Consumer errors
    /// and panics are converted to messages so every property is checked.
    pub fn configure(&self, target: &mut S, values: &HashMap<String, String>) -> Vec<String> {
        let mut errors = Vec::new();

        for property in &self.properties {
            let name = property.descriptor.name.as_str();
            let Some(value) = values.get(name) else {
                if property.descriptor.required {
                    errors.push(format!("{name} is required"));
                }
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| (property.consumer)(target, value))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    errors.push(format!("Unable to apply {name} value '{value}': {e}"));
                }
                Err(payload) => {
                    errors.push(format!(
                        "Unable to apply {name} value '{value}': {}",
                        panic_message(payload)
                    ));
                }
            }
        }

        for name in values.keys() {
            if self.get(name).is_none() {
                tracing::warn!(property = %name, "Ignoring unrecognized job property");
            }
        }

        errors
    }
}

impl<S> Default for JobPropertyRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for JobPropertyRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.properties.iter().map(|p| &p.descriptor.name))
            .finish()
    }
}

/// Parse a boolean property value
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(crate::domain::DatamoveError::Validation(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}
