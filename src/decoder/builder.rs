use serde_json::{Map, Value};

use crate::decoder::events::Event;

enum Partial {
    Object {
        map: Map<String, Value>,
        key: Option<String>,
    },
    Array(Vec<Value>),
}

/// Assembles a [`Value`] from a well-formed sequence of [`Event`]s.
#[derive(Default)]
pub struct ValueBuilder {
    stack: Vec<Partial>,
    value: Option<Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one event.
    pub fn event(&mut self, event: Event) {
        match event {
            Event::StartMap => self.stack.push(Partial::Object {
                map: Map::new(),
                key: None,
            }),
            Event::StartArray => self.stack.push(Partial::Array(Vec::new())),
            Event::MapKey(name) => {
                if let Some(Partial::Object { key, .. }) = self.stack.last_mut() {
                    *key = Some(name);
                }
            }
            Event::EndMap | Event::EndArray => {
                let value = match self.stack.pop() {
                    Some(Partial::Object { map, .. }) => Value::Object(map),
                    Some(Partial::Array(items)) => Value::Array(items),
                    None => return,
                };
                self.push(value);
            }
            Event::Scalar(value) => self.push(value),
        }
    }

    fn push(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.value = Some(value),
            Some(Partial::Object { map, key }) => {
                if let Some(key) = key.take() {
                    map.insert(key, value);
                }
            }
            Some(Partial::Array(items)) => items.push(value),
        }
    }

    /// `true` once a whole value has been assembled.
    pub fn is_complete(&self) -> bool {
        self.value.is_some()
    }

    pub fn finish(self) -> Option<Value> {
        self.value
    }
}
