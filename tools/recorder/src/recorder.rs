//! Record/replay verification over a tree of mock primitives.
//!
//! A `Recorder` starts out recording: every call is stored as an expectation.
//! After `stop()` the whole tree replays, and each live call must match the
//! oldest unconsumed expectation of the node it was made on.
//!
//! Nodes are `Rc`-shared and `!Send`. Replay relies on call *N* lining up
//! with recorded call *N*, so concurrent use is unsupported rather than
//! locked.

use crate::config::RecorderConfig;
use crate::errors::RecorderError;
use crate::logging::{JsonlLogger, LogEvent};
use crate::mock::{Mock, MockPrimitive};
use crate::types::{Call, Kwargs, Mode};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

// A return edge that leads back into the node's own ancestry is held weakly
// so that fluent self- or parent-returning mocks do not form `Rc` cycles.
enum ReturnEdge<M: MockPrimitive> {
    Unset,
    Node(Recorder<M>),
    Back(Weak<RefCell<Node<M>>>),
}

struct Node<M: MockPrimitive> {
    mode: Mode,
    primitive: Rc<RefCell<M>>,
    children: BTreeMap<String, Recorder<M>>,
    returns: ReturnEdge<M>,
    journal: Option<Rc<JsonlLogger>>,
}

pub struct Recorder<M: MockPrimitive = Mock> {
    node: Rc<RefCell<Node<M>>>,
}

impl<M: MockPrimitive> Clone for Recorder<M> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<M: MockPrimitive> fmt::Debug for Recorder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("name", &self.name())
            .field("mode", &self.mode())
            .field("pending", &self.pending_signatures())
            .finish()
    }
}

/// What an invocation hands back to the caller.
pub enum Returned<M: MockPrimitive = Mock> {
    Value(Value),
    Mock(Recorder<M>),
}

impl<M: MockPrimitive> Returned<M> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Mock(_) => None,
        }
    }

    pub fn as_mock(&self) -> Option<&Recorder<M>> {
        match self {
            Self::Value(_) => None,
            Self::Mock(node) => Some(node),
        }
    }

    pub fn into_mock(self) -> Option<Recorder<M>> {
        match self {
            Self::Value(_) => None,
            Self::Mock(node) => Some(node),
        }
    }
}

impl<M: MockPrimitive> PartialEq for Returned<M> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(left), Self::Value(right)) => left == right,
            (Self::Mock(left), Self::Mock(right)) => left.ptr_eq(right),
            _ => false,
        }
    }
}

impl<M: MockPrimitive> fmt::Debug for Returned<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Mock(node) => f.debug_tuple("Mock").field(&node.name()).finish(),
        }
    }
}

impl Recorder<Mock> {
    pub fn new() -> Self {
        Self::with_primitive(Mock::default())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_primitive(Mock::new(name))
    }

    pub fn from_config(cfg: &RecorderConfig) -> Self {
        let journal = cfg.journal.path.as_ref().map(|path| {
            Rc::new(JsonlLogger::new(path).with_max_payload_bytes(cfg.journal.max_payload_bytes))
        });
        Self::from_parts(Mock::new(cfg.mock.name.clone()), journal)
    }
}

impl Default for Recorder<Mock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MockPrimitive> Recorder<M> {
    pub fn with_primitive(primitive: M) -> Self {
        Self::from_parts(primitive, None)
    }

    fn from_parts(primitive: M, journal: Option<Rc<JsonlLogger>>) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                mode: Mode::Recording,
                primitive: Rc::new(RefCell::new(primitive)),
                children: BTreeMap::new(),
                returns: ReturnEdge::Unset,
                journal,
            })),
        }
    }

    /// Attach `journal` to every node currently in the tree; nodes created
    /// afterwards inherit it from their parent.
    pub fn with_journal(self, journal: JsonlLogger) -> Self {
        let journal = Rc::new(journal);
        for node in self.walk() {
            node.node.borrow_mut().journal = Some(Rc::clone(&journal));
        }
        self
    }

    pub fn primitive(&self) -> Rc<RefCell<M>> {
        Rc::clone(&self.node.borrow().primitive)
    }

    pub fn name(&self) -> String {
        self.node.borrow().primitive.borrow().name().to_string()
    }

    pub fn mode(&self) -> Mode {
        self.node.borrow().mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode() == Mode::Recording
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Switch this node, and only this node, to recording.
    pub fn record(&self) -> &Self {
        self.node.borrow_mut().mode = Mode::Recording;
        self.emit("info", "mode_changed", json!({"mode": Mode::Recording}));
        self
    }

    /// Switch this node and everything reachable from it to replaying.
    pub fn stop(&self) {
        for node in self.walk() {
            node.node.borrow_mut().mode = Mode::Replaying;
            node.emit("info", "mode_changed", json!({"mode": Mode::Replaying}));
        }
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Returned<M>, RecorderError> {
        self.invoke(args, Kwargs::new())
    }

    pub fn invoke(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Returned<M>, RecorderError> {
        let call = Call { args, kwargs };
        let (mode, plain) = {
            let node = self.node.borrow();
            let plain = node.primitive.borrow_mut().record_call(call);
            (node.mode, plain)
        };

        // Verify before touching the return node: a failed replay call must
        // not grow the tree with a fresh recording node.
        match mode {
            Mode::Recording => {
                if let Some(signature) = self.last_signature() {
                    self.emit("debug", "call_recorded", json!({"call": signature}));
                }
            }
            Mode::Replaying => self.verify_latest_call()?,
        }

        Ok(match plain {
            Some(value) => Returned::Value(value),
            None => Returned::Mock(self.return_node()),
        })
    }

    fn last_signature(&self) -> Option<String> {
        let primitive = self.primitive();
        let mock = primitive.borrow();
        mock.calls().back().map(|call| mock.render_call(call))
    }

    // The call just made sits at the back of the list; the oldest
    // unconsumed expectation sits at the front. Both are consumed.
    fn verify_latest_call(&self) -> Result<(), RecorderError> {
        let primitive = self.primitive();
        let mut mock = primitive.borrow_mut();
        let current = mock.calls_mut().pop_back().ok_or_else(|| {
            RecorderError::Usage(format!(
                "mock primitive `{}` did not record the call it was invoked with",
                mock.name()
            ))
        })?;
        let actual = mock.render_call(&current);

        let Some(expected_call) = mock.calls_mut().pop_front() else {
            drop(mock);
            self.emit("error", "unexpected_call", json!({"call": actual}));
            return Err(RecorderError::UnexpectedCall { call: actual });
        };
        let expected = mock.render_call(&expected_call);

        let matched = mock
            .match_key(&current)
            .matches(&mock.match_key(&expected_call));
        drop(mock);

        if !matched {
            self.emit(
                "error",
                "call_mismatch",
                json!({"expected": expected, "actual": actual}),
            );
            return Err(RecorderError::CallMismatch { expected, actual });
        }
        self.emit("debug", "call_verified", json!({"call": actual}));
        Ok(())
    }

    /// Child node for attribute `name`, created on first access. New
    /// children start out recording regardless of this node's mode.
    pub fn attr(&self, name: &str) -> Recorder<M> {
        if let Some(child) = self.node.borrow().children.get(name) {
            return child.clone();
        }
        let child = {
            let node = self.node.borrow();
            let primitive = node.primitive.borrow().child(name);
            Self::from_parts(primitive, node.journal.clone())
        };
        self.node
            .borrow_mut()
            .children
            .insert(name.to_string(), child.clone());
        child
    }

    /// Node handed back by calls when no plain return value is configured.
    /// A back edge whose target has already been dropped is replaced by a
    /// fresh return node.
    pub fn return_node(&self) -> Recorder<M> {
        if let Some(target) = self.return_target() {
            return target;
        }
        let node = {
            let node = self.node.borrow();
            let primitive = node.primitive.borrow().return_child();
            Self::from_parts(primitive, node.journal.clone())
        };
        self.node.borrow_mut().returns = ReturnEdge::Node(node.clone());
        node
    }

    fn return_target(&self) -> Option<Recorder<M>> {
        match &self.node.borrow().returns {
            ReturnEdge::Node(target) => Some(target.clone()),
            ReturnEdge::Back(weak) => weak.upgrade().map(|node| Recorder { node }),
            ReturnEdge::Unset => None,
        }
    }

    /// Make calls return `target`. `target` may be this node or one of its
    /// ancestors; such edges do not keep the target alive.
    pub fn set_return_node(&self, target: &Recorder<M>) {
        let closes_cycle = target.walk().iter().any(|node| node.ptr_eq(self));
        let edge = if closes_cycle {
            ReturnEdge::Back(Rc::downgrade(&target.node))
        } else {
            ReturnEdge::Node(target.clone())
        };
        let mut node = self.node.borrow_mut();
        node.primitive.borrow_mut().set_return_value(None);
        node.returns = edge;
    }

    /// A plain return value takes precedence over any return node.
    pub fn set_return_value(&self, value: impl Into<Value>) {
        self.primitive()
            .borrow_mut()
            .set_return_value(Some(value.into()));
    }

    pub fn pending_calls(&self) -> Vec<Call> {
        self.primitive().borrow().calls().iter().cloned().collect()
    }

    pub fn pending_signatures(&self) -> Vec<String> {
        let primitive = self.primitive();
        let mock = primitive.borrow();
        mock.calls().iter().map(|call| mock.render_call(call)).collect()
    }

    /// Fail if any node in the tree still holds recorded calls that were
    /// never replayed. Reported calls are drained.
    pub fn check_missing_calls(&self) -> Result<(), RecorderError> {
        let nodes = self.walk();
        if let Some(node) = nodes.iter().find(|node| node.is_recording()) {
            return Err(RecorderError::Usage(format!(
                "check_missing_calls on `{}` while it is still recording",
                node.name()
            )));
        }

        let mut missing = Vec::new();
        for node in &nodes {
            missing.extend(node.pending_signatures());
            node.primitive().borrow_mut().calls_mut().clear();
        }
        if missing.is_empty() {
            return Ok(());
        }
        self.emit("error", "missing_calls", json!({"calls": missing}));
        Err(RecorderError::MissingCalls { calls: missing })
    }

    /// Every node reachable from this one, self first, then attribute
    /// children by name, then the return node. Each node appears once.
    pub(crate) fn walk(&self) -> Vec<Recorder<M>> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        self.walk_into(&mut seen, &mut order);
        order
    }

    fn walk_into(&self, seen: &mut HashSet<*const RefCell<Node<M>>>, order: &mut Vec<Recorder<M>>) {
        if !seen.insert(Rc::as_ptr(&self.node)) {
            return;
        }
        order.push(self.clone());
        let children: Vec<Recorder<M>> = self.node.borrow().children.values().cloned().collect();
        let returns = self.return_target();
        for child in children {
            child.walk_into(seen, order);
        }
        if let Some(target) = returns {
            target.walk_into(seen, order);
        }
    }

    fn emit(&self, level: &str, event_type: &str, payload: Value) {
        let (journal, name) = {
            let node = self.node.borrow();
            let Some(journal) = node.journal.clone() else {
                return;
            };
            let name = node.primitive.borrow().name().to_string();
            (journal, name)
        };
        let _ = journal.append(&LogEvent {
            level,
            event_type,
            payload: json!({"mock": name, "detail": payload}),
        });
    }
}
