use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Kwargs = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Recording,
    Replaying,
}

/// Arguments of one invocation, in the shape they were passed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl Call {
    pub fn new<I, V>(args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs: Kwargs::new(),
        }
    }

    pub fn kw(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// `name(1, "a", key=true)`; values are rendered as compact JSON.
    pub fn render(&self, name: &str) -> String {
        let mut parts: Vec<String> = self.args.iter().map(render_value).collect();
        parts.extend(
            self.kwargs
                .iter()
                .map(|(key, value)| format!("{key}={}", render_value(value))),
        );
        format!("{name}({})", parts.join(", "))
    }
}

fn render_value(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Normalized comparison key for a call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallKey {
    Raw { args: Vec<Value>, kwargs: Kwargs },
    Bound(BTreeMap<String, Value>),
    Unbindable(String),
}

impl CallKey {
    /// An unbindable key never matches, not even another unbindable key.
    pub fn matches(&self, other: &CallKey) -> bool {
        match (self, other) {
            (Self::Unbindable(_), _) | (_, Self::Unbindable(_)) => false,
            (left, right) => left == right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_lists_positionals_then_sorted_keywords() {
        let call = Call::new([1, 2, 3]);
        assert_eq!(call.render("mock"), "mock(1, 2, 3)");

        let call = Call::new([json!("a")]).kw("z", true).kw("b", json!(null));
        assert_eq!(call.render("mock.db"), "mock.db(\"a\", b=null, z=true)");

        assert_eq!(Call::default().render("mock()"), "mock()()");
    }

    #[test]
    fn unbindable_keys_never_match() {
        let bad = CallKey::Unbindable("too many".to_string());
        assert!(!bad.matches(&bad.clone()));

        let raw = CallKey::Raw {
            args: vec![json!(1)],
            kwargs: Kwargs::new(),
        };
        assert!(raw.matches(&raw.clone()));
        assert!(!raw.matches(&bad));
    }

    #[test]
    fn mode_serializes_snake_case() {
        let text = serde_json::to_string(&Mode::Replaying).expect("serialize mode");
        assert_eq!(text, "\"replaying\"");
        assert_eq!(Mode::default(), Mode::Recording);
    }
}
