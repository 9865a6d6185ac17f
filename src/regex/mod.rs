//! Regex expression trees.
//!
//! Trees arrive fully described in the trace ([`RegexProps`]) and are materialized into a
//! [`RegexForest`]: an arena of [`RegexNode`]s plus the [`Registry`] that maps node
//! identifiers to arena slots. The forest owns:
//! - path resolution ([`RegexForest::at`])
//! - highlight marking ([`RegexForest::highlight`])
//!
//! Turning marks into animations, and focusing, lives in [`view`].

pub mod registry;
pub mod view;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::trace::{Notify, Trace};

pub use registry::Registry;
pub use view::{RegexView, RegexViewConfig};

/// Character-set polarity of a range node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeDir {
    Positive,
    Negative,
}

/// A regex tree as written by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegexProps {
    Accept {
        id: String,
        #[serde(rename = "tokenId")]
        token_id: i64,
        #[serde(default)]
        afters: Vec<String>,
    },
    Char {
        id: String,
        #[serde(rename = "char")]
        ch: String,
    },
    Range {
        id: String,
        dir: RangeDir,
        set: String,
    },
    Concat {
        id: String,
        lhs: Box<RegexProps>,
        rhs: Box<RegexProps>,
    },
    Union {
        id: String,
        lhs: Box<RegexProps>,
        rhs: Box<RegexProps>,
    },
    Kleene {
        id: String,
        sub: Box<RegexProps>,
    },
    Positive {
        id: String,
        sub: Box<RegexProps>,
    },
    Optional {
        id: String,
        sub: Box<RegexProps>,
    },
}

impl RegexProps {
    pub fn id(&self) -> &str {
        match self {
            RegexProps::Accept { id, .. }
            | RegexProps::Char { id, .. }
            | RegexProps::Range { id, .. }
            | RegexProps::Concat { id, .. }
            | RegexProps::Union { id, .. }
            | RegexProps::Kleene { id, .. }
            | RegexProps::Positive { id, .. }
            | RegexProps::Optional { id, .. } => id,
        }
    }
}

/// Variant data of a materialized node.
#[derive(Debug, Clone, PartialEq)]
pub enum RegexKind {
    Accept { token_id: i64, afters: Vec<String> },
    Char(String),
    Range { dir: RangeDir, set: String },
    Concat,
    Union,
    Kleene,
    Positive,
    Optional,
}

impl RegexKind {
    /// Text drawn inside the node.
    pub fn label(&self) -> String {
        match self {
            RegexKind::Accept { token_id, .. } => token_id.to_string(),
            RegexKind::Char(ch) => serde_json::to_string(ch).unwrap_or_else(|_| format!("{ch:?}")),
            RegexKind::Range { set, .. } => set.clone(),
            RegexKind::Concat => String::new(),
            RegexKind::Union => "|".to_string(),
            RegexKind::Kleene => "*".to_string(),
            RegexKind::Positive => "+".to_string(),
            RegexKind::Optional => "?".to_string(),
        }
    }

    #[inline]
    pub fn is_accept(&self) -> bool {
        matches!(self, RegexKind::Accept { .. })
    }
}

/// Arena slot of a node inside its [`RegexForest`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) usize);

impl NodeIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A drawn connection from a node to one of its children (or, for accept nodes, to an
/// "after" node elsewhere in the forest).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Edge {
    pub to: NodeIdx,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexNode {
    pub id: String,
    pub kind: RegexKind,
    pub parent: Option<NodeIdx>,
    /// Structural children: two for concat/union, one for unary nodes, none for leaves.
    pub subs: Vec<NodeIdx>,
    pub edges: Vec<Edge>,
    pub highlighted: bool,
}

/// A highlight or focus target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A node identifier, looked up directly.
    Id(String),
    /// A `/`-prefixed route from the tree root.
    Path(String),
    Node(NodeIdx),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        if s.starts_with('/') {
            Target::Path(s.to_string())
        } else {
            Target::Id(s.to_string())
        }
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        if s.starts_with('/') {
            Target::Path(s)
        } else {
            Target::Id(s)
        }
    }
}

impl From<NodeIdx> for Target {
    fn from(idx: NodeIdx) -> Self {
        Target::Node(idx)
    }
}

/// Normalized highlight targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    everything: bool,
    ids: HashSet<String>,
}

impl Selection {
    /// Selects every node.
    pub fn everything() -> Self {
        Self {
            everything: true,
            ids: HashSet::new(),
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            everything: false,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn selects(&self, id: &str) -> bool {
        self.everything || self.ids.contains(id)
    }

    #[inline]
    pub fn is_everything(&self) -> bool {
        self.everything
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.everything && self.ids.is_empty()
    }
}

/// Every regex node of one scene.
#[derive(Debug, Clone, Default)]
pub struct RegexForest {
    nodes: Vec<RegexNode>,
    registry: Registry,
    roots: Vec<NodeIdx>,
    patterns: Vec<(String, NodeIdx)>,
}

impl RegexForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize every regex event of `trace`, in order.
    pub fn from_trace(trace: &Trace) -> Self {
        let mut forest = Self::new();
        for notify in &trace.events {
            match notify {
                Notify::RegexCompile { pattern, regex } => {
                    let root = forest.add_tree(regex);
                    forest.patterns.push((pattern.clone(), root));
                }
                Notify::RegexAccept { accept } => {
                    forest.add_tree(accept);
                }
                Notify::RegexUnion { union, lhs, rhs } => {
                    if forest.union_existing(union, lhs, rhs).is_none() {
                        log::debug!(
                            "regex: union {union:?} skipped; {lhs:?} and {rhs:?} are not two roots"
                        );
                    }
                }
                _ => {}
            }
        }
        log::debug!(
            "regex: {} nodes in {} trees ({} compiled patterns)",
            forest.nodes.len(),
            forest.roots.len(),
            forest.patterns.len()
        );
        forest
    }

    /// Materialize `props` as a new tree root.
    pub fn add_tree(&mut self, props: &RegexProps) -> NodeIdx {
        let root = self.materialize(props, None);
        self.roots.push(root);
        root
    }

    /// Join two existing nodes under a new union node `id`.
    ///
    /// The joined nodes stop being roots. Returns `None` unless both sides are known,
    /// distinct, and currently roots.
    pub fn union_existing(&mut self, id: &str, lhs: &str, rhs: &str) -> Option<NodeIdx> {
        let l = self.registry.lookup(lhs)?;
        let r = self.registry.lookup(rhs)?;
        if l == r || !self.roots.contains(&l) || !self.roots.contains(&r) {
            return None;
        }
        let idx = self.push(id, RegexKind::Union, None);
        self.attach(idx, vec![l, r]);
        self.roots.retain(|root| *root != l && *root != r);
        self.roots.push(idx);
        Some(idx)
    }

    fn push(&mut self, id: &str, kind: RegexKind, parent: Option<NodeIdx>) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(RegexNode {
            id: id.to_string(),
            kind,
            parent,
            subs: Vec::new(),
            edges: Vec::new(),
            highlighted: true,
        });
        self.registry.register(id, idx);
        idx
    }

    fn attach(&mut self, idx: NodeIdx, subs: Vec<NodeIdx>) {
        for sub in &subs {
            self.nodes[sub.0].parent = Some(idx);
        }
        let node = &mut self.nodes[idx.0];
        node.edges = subs
            .iter()
            .map(|&to| Edge {
                to,
                emphasized: true,
            })
            .collect();
        node.subs = subs;
    }

    // The parent is registered before its children.
    fn materialize(&mut self, props: &RegexProps, parent: Option<NodeIdx>) -> NodeIdx {
        match props {
            RegexProps::Accept {
                id,
                token_id,
                afters,
            } => {
                let idx = self.push(
                    id,
                    RegexKind::Accept {
                        token_id: *token_id,
                        afters: afters.clone(),
                    },
                    parent,
                );
                let edges = afters
                    .iter()
                    .filter_map(|after| {
                        let found = self.registry.lookup(after);
                        if found.is_none() {
                            log::debug!("regex: accept {id:?} has unknown after {after:?}");
                        }
                        found
                    })
                    .map(|to| Edge {
                        to,
                        emphasized: true,
                    })
                    .collect();
                self.nodes[idx.0].edges = edges;
                idx
            }
            RegexProps::Char { id, ch } => self.push(id, RegexKind::Char(ch.clone()), parent),
            RegexProps::Range { id, dir, set } => self.push(
                id,
                RegexKind::Range {
                    dir: *dir,
                    set: set.clone(),
                },
                parent,
            ),
            RegexProps::Concat { id, lhs, rhs } | RegexProps::Union { id, lhs, rhs } => {
                let kind = if matches!(props, RegexProps::Concat { .. }) {
                    RegexKind::Concat
                } else {
                    RegexKind::Union
                };
                let idx = self.push(id, kind, parent);
                let l = self.materialize(lhs, Some(idx));
                let r = self.materialize(rhs, Some(idx));
                self.attach(idx, vec![l, r]);
                idx
            }
            RegexProps::Kleene { id, sub }
            | RegexProps::Positive { id, sub }
            | RegexProps::Optional { id, sub } => {
                let kind = match props {
                    RegexProps::Kleene { .. } => RegexKind::Kleene,
                    RegexProps::Positive { .. } => RegexKind::Positive,
                    _ => RegexKind::Optional,
                };
                let idx = self.push(id, kind, parent);
                let s = self.materialize(sub, Some(idx));
                self.attach(idx, vec![s]);
                idx
            }
        }
    }

    /// The node at `idx`. `idx` must come from this forest.
    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &RegexNode {
        &self.nodes[idx.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Look an identifier up in the registry.
    #[inline]
    pub fn find(&self, id: &str) -> Option<NodeIdx> {
        self.registry.lookup(id)
    }

    /// Current tree roots, in creation order.
    #[inline]
    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    /// `(pattern, root)` of every compiled regex.
    #[inline]
    pub fn patterns(&self) -> &[(String, NodeIdx)] {
        &self.patterns
    }

    /// Topmost ancestor of `idx`.
    pub fn root_of(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(parent) = self.nodes[idx.0].parent {
            idx = parent;
        }
        idx
    }

    /// Resolve `path` starting at `root`.
    ///
    /// A path without a leading `/` is an identifier: `root` itself if it matches,
    /// otherwise whatever the registry holds. A `/` path routes one child per character:
    /// leaves end the walk with `None`, single-child nodes take their child whatever the
    /// character, and two-child nodes go left on `'0'` or `'l'` and right on anything else.
    pub fn at(&self, root: NodeIdx, path: &str) -> Option<NodeIdx> {
        let Some(route) = path.strip_prefix('/') else {
            if self.nodes[root.0].id == path {
                return Some(root);
            }
            return self.registry.lookup(path);
        };

        let mut node = root;
        for c in route.chars() {
            let subs = &self.nodes[node.0].subs;
            node = match subs.as_slice() {
                [] => return None,
                [only] => *only,
                [lhs, rhs, ..] => {
                    if c == '0' || c == 'l' {
                        *lhs
                    } else {
                        *rhs
                    }
                }
            };
        }
        Some(node)
    }

    /// Normalize `targets` against the tree at `root`.
    ///
    /// An empty target list selects everything. Paths that do not resolve are skipped.
    pub fn select(&self, root: NodeIdx, targets: &[Target]) -> Selection {
        if targets.is_empty() {
            return Selection::everything();
        }
        let mut ids = HashSet::new();
        for target in targets {
            match target {
                Target::Id(id) => {
                    ids.insert(id.clone());
                }
                Target::Path(path) => match self.at(root, path) {
                    Some(idx) => {
                        ids.insert(self.nodes[idx.0].id.clone());
                    }
                    None => log::debug!("regex: highlight path {path:?} does not resolve"),
                },
                Target::Node(idx) => match self.nodes.get(idx.0) {
                    Some(node) => {
                        ids.insert(node.id.clone());
                    }
                    None => log::debug!("regex: highlight node {idx:?} is not in this forest"),
                },
            }
        }
        Selection {
            everything: false,
            ids,
        }
    }

    /// Mark the tree at `root` for `targets`. Returns whether `root` ended up lit.
    pub fn highlight(&mut self, root: NodeIdx, targets: &[Target]) -> bool {
        let selection = self.select(root, targets);
        self.mark(root, &selection)
    }

    /// Recursively set highlight flags and edge emphasis below `idx`.
    ///
    /// A node is lit when it is selected or any child is lit. An edge is emphasized when
    /// both of its ends are lit; child edges are decided after the child's subtree.
    pub fn mark(&mut self, idx: NodeIdx, selection: &Selection) -> bool {
        let direct = selection.selects(&self.nodes[idx.0].id);
        let subs = self.nodes[idx.0].subs.clone();
        let mut any_child = false;
        for sub in subs {
            any_child |= self.mark(sub, selection);
        }
        let lit = direct || any_child;

        let ends: Vec<bool> = self.nodes[idx.0]
            .edges
            .iter()
            .map(|edge| self.nodes[edge.to.0].highlighted)
            .collect();
        let node = &mut self.nodes[idx.0];
        node.highlighted = lit;
        for (edge, end_lit) in node.edges.iter_mut().zip(ends) {
            edge.emphasized = lit && end_lit;
        }
        lit
    }

    /// Nodes of the tree at `root`, parents before children.
    pub fn preorder(&self, root: NodeIdx) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx.0].subs.iter().rev());
        }
        out
    }

    /// Route of every leaf under `root`, left to right.
    pub fn leaf_paths(&self, root: NodeIdx) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_paths(root, "/".to_string(), &mut out);
        out
    }

    fn collect_leaf_paths(&self, idx: NodeIdx, route: String, out: &mut Vec<String>) {
        let subs = &self.nodes[idx.0].subs;
        if subs.is_empty() {
            out.push(route);
            return;
        }
        for (i, sub) in subs.iter().enumerate() {
            let step = if i == 0 { '0' } else { '1' };
            self.collect_leaf_paths(*sub, format!("{route}{step}"), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn props(json: &str) -> RegexProps {
        serde_json::from_str(json).unwrap()
    }

    /// `concat(union(a, b), kleene(c))`
    fn sample() -> (RegexForest, NodeIdx) {
        let mut forest = RegexForest::new();
        let root = forest.add_tree(&props(
            r#"{"type":"concat","id":"r",
                "lhs":{"type":"union","id":"u",
                    "lhs":{"type":"char","id":"a","char":"a"},
                    "rhs":{"type":"char","id":"b","char":"b"}},
                "rhs":{"type":"kleene","id":"k",
                    "sub":{"type":"char","id":"c","char":"c"}}}"#,
        ));
        (forest, root)
    }

    fn id_at(forest: &RegexForest, root: NodeIdx, path: &str) -> Option<String> {
        forest.at(root, path).map(|idx| forest.node(idx).id.clone())
    }

    #[rstest]
    #[case("/", Some("r"))]
    #[case("/0", Some("u"))]
    #[case("/l", Some("u"))]
    #[case("/1", Some("k"))]
    #[case("/r", Some("k"))]
    #[case("/x", Some("k"))]
    #[case("/00", Some("a"))]
    #[case("/0l", Some("a"))]
    #[case("/01", Some("b"))]
    #[case("/10", Some("c"))]
    #[case("/1z", Some("c"))]
    #[case("/000", None)]
    #[case("/10x", None)]
    #[case("k", Some("k"))]
    #[case("r", Some("r"))]
    #[case("nope", None)]
    fn routes(#[case] path: &str, #[case] expected: Option<&str>) {
        let (forest, root) = sample();
        assert_eq!(id_at(&forest, root, path).as_deref(), expected);
    }

    #[test]
    fn materializes_arity() {
        let (forest, root) = sample();
        assert_eq!(forest.len(), 6);
        assert_eq!(forest.node(root).subs.len(), 2);
        let k = forest.find("k").unwrap();
        assert_eq!(forest.node(k).subs.len(), 1);
        let c = forest.find("c").unwrap();
        assert!(forest.node(c).subs.is_empty());
        assert_eq!(forest.node(c).parent, Some(k));
        assert_eq!(forest.root_of(c), root);
    }

    #[test]
    fn empty_targets_light_everything() {
        let (mut forest, root) = sample();
        forest.highlight(root, &[Target::from("a")]);
        assert!(forest.highlight(root, &[]));
        for idx in forest.preorder(root) {
            let node = forest.node(idx);
            assert!(node.highlighted, "{} should be lit", node.id);
            assert!(node.edges.iter().all(|e| e.emphasized));
        }
    }

    #[test]
    fn leaf_highlight_lights_path_to_root() {
        let mut forest = RegexForest::new();
        let root = forest.add_tree(&props(
            r#"{"type":"concat","id":"root",
                "lhs":{"type":"char","id":"a","char":"a"},
                "rhs":{"type":"char","id":"b","char":"b"}}"#,
        ));
        forest.highlight(root, &["a".into()]);

        let lit = |id: &str| forest.node(forest.find(id).unwrap()).highlighted;
        assert!(lit("root"));
        assert!(lit("a"));
        assert!(!lit("b"));
        let edges = &forest.node(root).edges;
        assert!(edges[0].emphasized);
        assert!(!edges[1].emphasized);
    }

    #[test]
    fn unresolved_paths_are_skipped() {
        let (mut forest, root) = sample();
        let selection = forest.select(root, &["/000".into(), "/10".into()]);
        assert!(selection.selects("c"));
        assert_eq!(selection.len(), 1);

        forest.highlight(root, &["/000".into()]);
        assert!(forest.preorder(root).iter().all(|&i| !forest.node(i).highlighted));
    }

    #[test]
    fn duplicate_ids_keep_last() {
        let mut forest = RegexForest::new();
        let first = forest.add_tree(&props(r#"{"type":"char","id":"x","char":"1"}"#));
        let second = forest.add_tree(&props(r#"{"type":"char","id":"x","char":"2"}"#));
        assert_ne!(first, second);
        assert_eq!(forest.find("x"), Some(second));
    }

    #[test]
    fn accept_links_known_afters() {
        let (mut forest, _) = sample();
        let accept = forest.add_tree(&props(
            r#"{"type":"accept","id":"acc","tokenId":3,"afters":["a","b","gone"]}"#,
        ));
        let node = forest.node(accept);
        assert_eq!(node.kind.label(), "3");
        assert!(node.subs.is_empty());
        assert_eq!(node.edges.len(), 2);

        // After edges follow the after node's current flag.
        let a = forest.find("a").unwrap();
        let root = forest.root_of(a);
        forest.highlight(root, &["a".into()]);
        forest.highlight(accept, &[]);
        let edges = &forest.node(accept).edges;
        assert!(edges[0].emphasized);
        assert!(!edges[1].emphasized);
    }

    #[test]
    fn union_joins_roots() {
        let mut forest = RegexForest::new();
        forest.add_tree(&props(r#"{"type":"char","id":"p","char":"p"}"#));
        forest.add_tree(&props(r#"{"type":"char","id":"q","char":"q"}"#));
        let u = forest.union_existing("pq", "p", "q").unwrap();
        assert_eq!(forest.roots(), &[u]);
        assert_eq!(id_at(&forest, u, "/1").as_deref(), Some("q"));
        assert!(forest.union_existing("bad", "p", "missing").is_none());
    }

    #[test]
    fn union_rejects_non_roots_and_self() {
        let mut forest = RegexForest::new();
        forest.add_tree(&props(r#"{"type":"char","id":"p","char":"p"}"#));
        forest.add_tree(&props(r#"{"type":"char","id":"q","char":"q"}"#));
        assert!(forest.union_existing("pp", "p", "p").is_none());
        assert!(!forest.registry().contains("pp"));

        let u = forest.union_existing("pq", "p", "q").unwrap();
        forest.add_tree(&props(r#"{"type":"char","id":"s","char":"s"}"#));
        // p already hangs under pq.
        assert!(forest.union_existing("ps", "p", "s").is_none());
        let p = forest.find("p").unwrap();
        assert_eq!(forest.root_of(p), u);
        assert_eq!(forest.roots().len(), 2);
    }

    #[test]
    fn node_targets_select_by_handle() {
        let mut forest = RegexForest::new();
        let root = forest.add_tree(&props(
            r#"{"type":"concat","id":"root",
                "lhs":{"type":"char","id":"a","char":"a"},
                "rhs":{"type":"char","id":"b","char":"b"}}"#,
        ));
        let b = forest.find("b").unwrap();
        assert!(forest.highlight(root, &[Target::from(b)]));
        let lit = |f: &RegexForest, id: &str| f.node(f.find(id).unwrap()).highlighted;
        assert!(lit(&forest, "root") && lit(&forest, "b"));
        assert!(!lit(&forest, "a"));

        let stale = NodeIdx(forest.len() + 5);
        assert!(!forest.highlight(root, &[Target::Node(stale)]));
        assert!(!lit(&forest, "root") && !lit(&forest, "a") && !lit(&forest, "b"));
    }

    #[test]
    fn leaf_paths_walk_left_to_right() {
        let (forest, root) = sample();
        assert_eq!(forest.leaf_paths(root), vec!["/00", "/01", "/10"]);
        for path in forest.leaf_paths(root) {
            assert!(forest.node(forest.at(root, &path).unwrap()).subs.is_empty());
        }
    }

    #[test]
    fn labels() {
        assert_eq!(RegexKind::Char("a".into()).label(), "\"a\"");
        assert_eq!(RegexKind::Char("\n".into()).label(), "\"\\n\"");
        assert_eq!(RegexKind::Union.label(), "|");
        assert_eq!(RegexKind::Concat.label(), "");
    }
}
