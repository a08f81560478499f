//! The mock primitive a `Recorder` decorates.
//!
//! `MockPrimitive` is the seam: anything that captures calls in order, renders
//! them, and produces comparison keys can sit under a recorder. `Mock` is the
//! implementation shipped with the crate.

use crate::signature::Signature;
use crate::types::{Call, CallKey};
use serde_json::Value;
use std::collections::VecDeque;

pub trait MockPrimitive {
    /// Dotted path of this mock inside its tree, e.g. `mock.db.query()`.
    fn name(&self) -> &str;

    /// Append `call` to the call list; returns the configured plain return
    /// value, if any.
    fn record_call(&mut self, call: Call) -> Option<Value>;

    fn calls(&self) -> &VecDeque<Call>;
    fn calls_mut(&mut self) -> &mut VecDeque<Call>;

    fn render_call(&self, call: &Call) -> String {
        call.render(self.name())
    }

    fn match_key(&self, call: &Call) -> CallKey;

    fn set_return_value(&mut self, value: Option<Value>);

    /// Primitive for the attribute child `name`.
    fn child(&self, name: &str) -> Self
    where
        Self: Sized;

    /// Primitive for the value returned by calling this mock.
    fn return_child(&self) -> Self
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mock {
    name: String,
    calls: VecDeque<Call>,
    return_value: Option<Value>,
    signature: Option<Signature>,
}

impl Mock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: VecDeque::new(),
            return_value: None,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_return_value(mut self, value: impl Into<Value>) -> Self {
        self.return_value = Some(value.into());
        self
    }
}

impl Default for Mock {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockPrimitive for Mock {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_call(&mut self, call: Call) -> Option<Value> {
        self.calls.push_back(call);
        self.return_value.clone()
    }

    fn calls(&self) -> &VecDeque<Call> {
        &self.calls
    }

    fn calls_mut(&mut self) -> &mut VecDeque<Call> {
        &mut self.calls
    }

    fn match_key(&self, call: &Call) -> CallKey {
        match &self.signature {
            Some(signature) => signature.bind(call),
            None => CallKey::Raw {
                args: call.args.clone(),
                kwargs: call.kwargs.clone(),
            },
        }
    }

    fn set_return_value(&mut self, value: Option<Value>) {
        self.return_value = value;
    }

    // Children never inherit the parent's signature or return value.
    fn child(&self, name: &str) -> Self {
        Self::new(format!("{}.{name}", self.name))
    }

    fn return_child(&self) -> Self {
        Self::new(format!("{}()", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Param;
    use serde_json::json;

    #[test]
    fn record_call_appends_in_order_and_returns_configured_value() {
        let mut mock = Mock::new("f").with_return_value(7);
        assert_eq!(mock.record_call(Call::new([1])), Some(json!(7)));
        mock.record_call(Call::new([2]));
        let rendered: Vec<String> = mock.calls().iter().map(|c| mock.render_call(c)).collect();
        assert_eq!(rendered, vec!["f(1)", "f(2)"]);

        mock.set_return_value(None);
        assert_eq!(mock.record_call(Call::new([3])), None);
    }

    #[test]
    fn children_extend_the_dotted_path() {
        let root = Mock::default();
        let db = root.child("db");
        assert_eq!(db.name(), "mock.db");
        assert_eq!(db.return_child().name(), "mock.db()");
        assert_eq!(root.return_child().child("close").name(), "mock().close");
    }

    #[test]
    fn match_key_uses_signature_when_present() {
        let mock = Mock::new("f").with_signature(Signature::new(vec![
            Param::required("a"),
            Param::optional("b", 2),
        ]));
        let left = mock.match_key(&Call::new([1]));
        let right = mock.match_key(&Call::default().kw("a", 1).kw("b", 2));
        assert!(left.matches(&right));

        let plain = Mock::new("f");
        assert!(!plain
            .match_key(&Call::new([1]))
            .matches(&plain.match_key(&Call::default().kw("a", json!(1)))));
    }
}
