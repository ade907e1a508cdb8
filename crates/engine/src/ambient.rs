//! Ambient context: named values available to every block of a run,
//! independent of graph wiring.

use serde_json::Value;

/// Ordered `(name, value)` pairs supplied by whoever starts the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbientContext {
    vars: Vec<(String, Value)>,
}

impl AmbientContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a value; an existing entry of the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AmbientContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insertion_order_is_kept_and_names_are_unique() {
        let ctx = AmbientContext::new()
            .with("event", json!({ "id": 1 }))
            .with("bot", "handle")
            .with("event", json!({ "id": 2 }));

        let names: Vec<_> = ctx.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["event", "bot"]);
        assert_eq!(ctx.get("event"), Some(&json!({ "id": 2 })));
        assert_eq!(ctx.len(), 2);
    }
}
