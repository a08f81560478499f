//! Optional parameter lists used to normalize calls before comparison.
//!
//! Without a signature two calls match only when their positional and keyword
//! arguments are identical. With one, every call is bound to parameter names
//! first, so `f(1)`, `f(a=1)` and `f(1, b=2)` (where `b` defaults to `2`) all
//! compare equal.

use crate::types::{Call, CallKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    pub fn bind(&self, call: &Call) -> CallKey {
        match self.try_bind(call) {
            Ok(bound) => CallKey::Bound(bound),
            Err(reason) => CallKey::Unbindable(reason),
        }
    }

    fn try_bind(&self, call: &Call) -> Result<BTreeMap<String, Value>, String> {
        if call.args.len() > self.params.len() {
            return Err(format!(
                "takes {} positional arguments but {} were given",
                self.params.len(),
                call.args.len()
            ));
        }

        let mut bound = BTreeMap::new();
        for (param, value) in self.params.iter().zip(&call.args) {
            bound.insert(param.name.clone(), value.clone());
        }

        for (key, value) in &call.kwargs {
            if !self.params.iter().any(|param| &param.name == key) {
                return Err(format!("unexpected keyword argument '{key}'"));
            }
            if bound.insert(key.clone(), value.clone()).is_some() {
                return Err(format!("multiple values for argument '{key}'"));
            }
        }

        for param in &self.params {
            if bound.contains_key(&param.name) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    bound.insert(param.name.clone(), default.clone());
                }
                None => return Err(format!("missing required argument '{}'", param.name)),
            }
        }

        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_signature() -> Signature {
        Signature::new(vec![Param::required("sql"), Param::optional("limit", 10)])
    }

    #[test]
    fn positional_keyword_and_default_forms_bind_identically() {
        let sig = query_signature();
        let a = sig.bind(&Call::new([json!("select 1")]));
        let b = sig.bind(&Call::default().kw("sql", "select 1"));
        let c = sig.bind(&Call::new([json!("select 1"), json!(10)]));
        assert!(a.matches(&b));
        assert!(a.matches(&c));
        assert!(!a.matches(&sig.bind(&Call::new([json!("select 1"), json!(5)]))));
    }

    #[test]
    fn binding_failures_are_unbindable() {
        let sig = query_signature();
        let cases = [
            Call::new([1, 2, 3]),
            Call::new([1]).kw("sql", 2),
            Call::new([1]).kw("offset", 0),
            Call::default(),
        ];
        for call in cases {
            assert!(
                matches!(sig.bind(&call), CallKey::Unbindable(_)),
                "expected {call:?} to be unbindable"
            );
        }
    }
}
