use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyFormatter;

/// Optional handler invoked synchronously with a typed payload, e.g. a chart
/// reporting which data point was clicked.
pub struct EventHook<T> {
    handler: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T> EventHook<T> {
    pub fn none() -> Self {
        Self { handler: None }
    }

    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
        }
    }

    pub fn is_set(&self) -> bool {
        self.handler.is_some()
    }

    /// Runs the handler, if any. Returns `true` when one ran.
    pub fn emit(&self, payload: &T) -> bool {
        match &self.handler {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for EventHook<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> Clone for EventHook<T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<T> fmt::Debug for EventHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHook")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Drill-in payload emitted by dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    pub fn display_value(&self, formatter: &CurrencyFormatter) -> String {
        formatter.format_with_symbol(self.value)
    }
}
