//! A small document model, just enough to host the toggle.
//!
//! Nodes are cheap handles over shared state. Events bubble from the target
//! to the root and listeners run synchronously inside [`Node::dispatch`].

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
    },
};

use encore_dependencies::{lazy_static, regex::Regex, url::Url};

use crate::error::{ToggleError, ToggleResult};

pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

struct NodeInner {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    children: Vec<Node>,
    parent: Option<Weak<RwLock<NodeInner>>>,
    listeners: Vec<(u64, String, Listener)>,
}

#[derive(Clone)]
pub struct Node(Arc<RwLock<NodeInner>>);

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        f.debug_struct("Node")
            .field("tag", &inner.tag)
            .field("attributes", &inner.attributes)
            .field("classes", &inner.classes)
            .field("children", &inner.children.len())
            .finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self(Arc::new(RwLock::new(NodeInner {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            children: Vec::new(),
            parent: None,
            listeners: Vec::new(),
        })))
    }

    // a listener panicking must not take the page down with it
    fn read(&self) -> RwLockReadGuard<'_, NodeInner> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeInner> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tag(&self) -> String {
        self.read().tag.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.read().attributes.get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.write()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn class_list(&self) -> Vec<String> {
        self.read().classes.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.read().classes.iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        let mut inner = self.write();
        if !inner.classes.iter().any(|c| c == class) {
            inner.classes.push(class.to_string());
        }
    }

    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Swaps `old` for `new` in place. Nothing happens unless `old` is present.
    pub fn replace_class(&self, old: &str, new: &str) -> bool {
        let mut inner = self.write();
        let pos = match inner.classes.iter().position(|c| c == old) {
            Some(pos) => pos,
            None => return false,
        };
        if inner.classes.iter().any(|c| c == new) {
            inner.classes.remove(pos);
        } else {
            inner.classes[pos] = new.to_string();
        }
        true
    }

    pub fn append_child(&self, child: Node) {
        child.write().parent = Some(Arc::downgrade(&self.0));
        self.write().children.push(child);
    }

    pub fn with_child(self, child: Node) -> Self {
        self.append_child(child);
        self
    }

    pub fn children(&self) -> Vec<Node> {
        self.read().children.clone()
    }

    pub fn parent(&self) -> Option<Node> {
        self.read()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Node)
    }

    /// Depth first search of this node and its descendants
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        if self.id().as_deref() == Some(id) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find_by_id(id))
    }

    pub fn add_event_listener<F>(&self, kind: &str, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER.fetch_add(1, Ordering::Relaxed);
        self.write()
            .listeners
            .push((id, kind.to_string(), Arc::new(listener)));
        Subscription {
            node: Arc::downgrade(&self.0),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.read().listeners.len()
    }

    /// Delivers an event to this node and then every ancestor.
    pub fn dispatch(&self, event: &Event) {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            // listeners may touch the node, so no lock is held while they run
            let listeners: Vec<Listener> = node
                .read()
                .listeners
                .iter()
                .filter(|(_, kind, _)| *kind == event.kind)
                .map(|(_, _, l)| l.clone())
                .collect();
            for listener in listeners {
                listener(event);
            }
            current = node.parent();
        }
    }
}

/// Owned registration of a listener, dropping it removes the listener
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    node: Weak<RwLock<NodeInner>>,
    id: u64,
}

impl Subscription {
    pub fn detach(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(node) = self.node.upgrade() {
            node.write()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .retain(|(id, _, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub struct Event {
    kind: String,
    target: Node,
    default_prevented: AtomicBool,
}

impl Event {
    pub fn new(kind: &str, target: Node) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            default_prevented: AtomicBool::new(false),
        }
    }
    pub fn kind(&self) -> &str {
        &self.kind
    }
    /// The node the event was dispatched at, not the one listening
    pub fn target(&self) -> &Node {
        &self.target
    }
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub default_prevented: bool,
    /// Where the browser would have gone if nobody prevented the default
    pub navigation: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    root: Node,
}

lazy_static::lazy_static! {
    static ref FAV_ANCHOR: Regex =
        Regex::new(r#"(?s)<a\s([^>]*\bid="([^"]*)"[^>]*)>\s*<i\s([^>]*)>"#).unwrap();
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)="([^"]*)""#).unwrap();
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn element_from_attributes(tag: &str, attributes: &str) -> Node {
    let node = Node::new(tag);
    for cap in ATTRIBUTE.captures_iter(attributes) {
        let value = unescape(&cap[2]);
        if &cap[1] == "class" {
            value.split_whitespace().for_each(|c| node.add_class(c));
        } else {
            node.set_attribute(&cap[1], &value);
        }
    }
    node
}

impl Document {
    pub fn new(url: Url, root: Node) -> Self {
        Self { url, root }
    }

    /// Pulls every `<a id=...><i ...>` pair out of rendered markup.
    ///
    /// This is not an HTML parser. It understands the icon links the album
    /// pages render and nothing else.
    pub fn from_markup(url: Url, markup: &str) -> Self {
        let root = Node::new("body");
        for cap in FAV_ANCHOR.captures_iter(markup) {
            let link = element_from_attributes("a", &cap[1]);
            link.append_child(element_from_attributes("i", &cap[3]));
            root.append_child(link);
        }
        Self { url, root }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.root.find_by_id(id)
    }

    pub fn require_element_by_id(&self, id: &str) -> ToggleResult<Node> {
        self.get_element_by_id(id)
            .ok_or_else(|| ToggleError::MissingElement(id.to_string()))
    }

    /// Resolves a possibly relative reference against the document URL
    pub fn resolve(&self, href: &str) -> ToggleResult<Url> {
        Ok(self.url.join(href)?)
    }

    /// Clicks `target` like a user would, reporting whether the default
    /// navigation of the nearest enclosing link was prevented.
    pub fn click(&self, target: &Node) -> ClickOutcome {
        let event = Event::new("click", target.clone());
        target.dispatch(&event);
        let default_prevented = event.default_prevented();
        let navigation = if default_prevented {
            None
        } else {
            let mut current = Some(target.clone());
            let mut href = None;
            while let Some(node) = current {
                if node.tag() == "a" {
                    href = node.attribute("href");
                    if href.is_some() {
                        break;
                    }
                }
                current = node.parent();
            }
            href.and_then(|h| self.url.join(&h).ok())
        };
        ClickOutcome {
            default_prevented,
            navigation,
        }
    }
}
