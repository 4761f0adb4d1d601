//! XPath expression evaluation

use std::cmp::Ordering;
use std::collections::HashSet;

use super::XPathError;
use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::node::NodeData;
use crate::{DomTree, NodeId, NodeType};

/// A node in an XPath result
///
/// Attributes are not tree nodes here, so they carry their owner element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XPathNode {
    Node(NodeId),
    Attribute {
        owner: NodeId,
        name: String,
        value: String,
    },
}

impl XPathNode {
    /// The tree node backing this result (an attribute's owner element)
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Node(id) => *id,
            Self::Attribute { owner, .. } => *owner,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute { .. })
    }

    /// XPath string-value
    pub fn string_value(&self, tree: &DomTree) -> String {
        match self {
            Self::Attribute { value, .. } => value.clone(),
            Self::Node(id) => match tree.get(*id).map(|n| &n.data) {
                Some(NodeData::Text(text)) => text.content.clone(),
                Some(NodeData::Comment(content)) => content.clone(),
                Some(NodeData::Element(_) | NodeData::Document) => tree.text_content(*id),
                _ => String::new(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    NodeSet(Vec<XPathNode>),
    Boolean(bool),
    Number(f64),
    String(String),
}

struct Context {
    node: XPathNode,
    position: usize,
    size: usize,
}

pub(super) fn evaluate_node_set(
    tree: &DomTree,
    expr: &Expr,
    context: NodeId,
) -> Result<Vec<XPathNode>, XPathError> {
    let evaluator = Evaluator { tree };
    let ctx = Context {
        node: XPathNode::Node(context),
        position: 1,
        size: 1,
    };
    match evaluator.eval(expr, &ctx)? {
        Value::NodeSet(nodes) => Ok(nodes),
        _ => Err(XPathError::NotANodeSet),
    }
}

struct Evaluator<'a> {
    tree: &'a DomTree,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value, XPathError> {
        match expr {
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Negate(inner) => {
                let value = self.eval(inner, ctx)?;
                Ok(Value::Number(-self.to_number(&value)))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    XPathNode::Node(self.tree.root())
                } else {
                    ctx.node.clone()
                };
                Ok(Value::NodeSet(self.apply_steps(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let Value::NodeSet(mut nodes) = self.eval(primary, ctx)? else {
                    return Err(XPathError::NotANodeSet);
                };
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(Value::NodeSet(self.apply_steps(nodes, steps)?))
            }
            Expr::Union(left, right) => {
                let (Value::NodeSet(mut a), Value::NodeSet(b)) =
                    (self.eval(left, ctx)?, self.eval(right, ctx)?)
                else {
                    return Err(XPathError::NotANodeSet);
                };
                a.extend(b);
                self.sort_unique(&mut a);
                Ok(Value::NodeSet(a))
            }
            Expr::Binary(op, left, right) => self.eval_binary(*op, left, right, ctx),
            Expr::Function(name, args) => self.call(name, args, ctx),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context,
    ) -> Result<Value, XPathError> {
        match op {
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?;
                if self.to_boolean(&l) {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.to_boolean(&r)))
            }
            BinaryOp::And => {
                let l = self.eval(left, ctx)?;
                if !self.to_boolean(&l) {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.to_boolean(&r)))
            }
            BinaryOp::Eq
            | BinaryOp::Neq
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(op, &l, &r)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.to_number(&self.eval(left, ctx)?);
                let r = self.to_number(&self.eval(right, ctx)?);
                Ok(Value::Number(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    _ => l % r,
                }))
            }
        }
    }

    // --- Location steps ---

    fn apply_steps(&self, mut nodes: Vec<XPathNode>, steps: &[Step]) -> Result<Vec<XPathNode>, XPathError> {
        for step in steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for node in &nodes {
                let mut candidates: Vec<XPathNode> = self
                    .axis(node, step.axis)
                    .into_iter()
                    .filter(|n| self.node_test(n, &step.test, step.axis))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate)?;
                }
                for candidate in candidates {
                    if seen.insert(candidate.clone()) {
                        next.push(candidate);
                    }
                }
            }
            self.sort_unique(&mut next);
            nodes = next;
        }
        Ok(nodes)
    }

    /// Keep the nodes for which `predicate` holds; positions follow the
    /// order of `nodes`
    fn filter(&self, nodes: Vec<XPathNode>, predicate: &Expr) -> Result<Vec<XPathNode>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::new();
        for (i, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, &ctx)? {
                Value::Number(n) => n == (i + 1) as f64,
                other => self.to_boolean(&other),
            };
            if keep {
                kept.push(ctx.node);
            }
        }
        Ok(kept)
    }

    /// Nodes along `axis` in axis order (nearest first for reverse axes)
    fn axis(&self, node: &XPathNode, axis: Axis) -> Vec<XPathNode> {
        let tree = self.tree;
        let id = match node {
            XPathNode::Node(id) => *id,
            XPathNode::Attribute { owner, .. } => {
                return match axis {
                    Axis::SelfAxis | Axis::DescendantOrSelf => vec![node.clone()],
                    Axis::Parent => vec![XPathNode::Node(*owner)],
                    Axis::Ancestor => {
                        let mut out = vec![XPathNode::Node(*owner)];
                        out.extend(wrap(tree.ancestors(*owner)));
                        out
                    }
                    Axis::AncestorOrSelf => {
                        let mut out = vec![node.clone(), XPathNode::Node(*owner)];
                        out.extend(wrap(tree.ancestors(*owner)));
                        out
                    }
                    Axis::Following => {
                        let mut out = wrap(tree.descendants(*owner));
                        out.extend(self.axis(&XPathNode::Node(*owner), Axis::Following));
                        out
                    }
                    Axis::Preceding => self.axis(&XPathNode::Node(*owner), Axis::Preceding),
                    _ => Vec::new(),
                };
            }
        };

        match axis {
            Axis::Child => wrap(tree.child_ids(id)),
            Axis::Descendant => wrap(tree.descendants(id)),
            Axis::DescendantOrSelf => wrap(std::iter::once(id).chain(tree.descendants(id))),
            Axis::SelfAxis => vec![node.clone()],
            Axis::Parent => wrap(tree.parent(id).into_iter()),
            Axis::Ancestor => wrap(tree.ancestors(id)),
            Axis::AncestorOrSelf => wrap(std::iter::once(id).chain(tree.ancestors(id))),
            Axis::FollowingSibling => {
                wrap(std::iter::successors(tree.next_sibling(id), |&n| tree.next_sibling(n)))
            }
            Axis::PrecedingSibling => wrap(std::iter::successors(tree.previous_sibling(id), |&n| {
                tree.previous_sibling(n)
            })),
            Axis::Following => {
                let mut out = Vec::new();
                for start in std::iter::once(id).chain(tree.ancestors(id)) {
                    let mut sibling = tree.next_sibling(start);
                    while let Some(s) = sibling {
                        out.push(XPathNode::Node(s));
                        out.extend(wrap(tree.descendants(s)));
                        sibling = tree.next_sibling(s);
                    }
                }
                out.sort_by(|a, b| self.document_order(a, b));
                out
            }
            Axis::Preceding => {
                let root = tree.ancestors(id).last().unwrap_or(id);
                let mut out: Vec<XPathNode> = tree
                    .descendants(root)
                    .take_while(|&n| n != id)
                    .filter(|&n| !tree.is_ancestor_of(n, id))
                    .map(XPathNode::Node)
                    .collect();
                out.reverse();
                out
            }
            Axis::Attribute => tree
                .attributes(id)
                .into_iter()
                .map(|(name, value)| XPathNode::Attribute {
                    owner: id,
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    fn node_test(&self, node: &XPathNode, test: &NodeTest, axis: Axis) -> bool {
        match node {
            XPathNode::Attribute { name, .. } => match test {
                NodeTest::AnyNode => true,
                NodeTest::Wildcard => axis == Axis::Attribute,
                NodeTest::Name(wanted) => axis == Axis::Attribute && name_matches(wanted, name),
                NodeTest::Text | NodeTest::Comment => false,
            },
            XPathNode::Node(id) => {
                let node_type = self.tree.get(*id).map(|n| n.node_type());
                match test {
                    NodeTest::AnyNode => true,
                    NodeTest::Text => node_type == Some(NodeType::Text),
                    NodeTest::Comment => node_type == Some(NodeType::Comment),
                    NodeTest::Wildcard => node_type == Some(NodeType::Element),
                    NodeTest::Name(wanted) => self
                        .tree
                        .tag_name(*id)
                        .is_some_and(|tag| name_matches(wanted, tag)),
                }
            }
        }
    }

    // --- Ordering ---

    fn sort_unique(&self, nodes: &mut Vec<XPathNode>) {
        nodes.sort_by(|a, b| self.document_order(a, b));
        nodes.dedup();
    }

    fn document_order(&self, a: &XPathNode, b: &XPathNode) -> Ordering {
        let tree = self.tree;
        // Attributes sort after their owner and before its children
        let attr_vs_node = |owner: NodeId, node: NodeId| {
            if owner == node {
                Ordering::Greater
            } else if tree.is_ancestor_of(owner, node) {
                Ordering::Less
            } else {
                tree.compare_document_position(owner, node)
            }
        };
        match (a, b) {
            (XPathNode::Node(x), XPathNode::Node(y)) => tree.compare_document_position(*x, *y),
            (
                XPathNode::Attribute { owner: o1, name: n1, .. },
                XPathNode::Attribute { owner: o2, name: n2, .. },
            ) => {
                if o1 == o2 {
                    let index = |name: &str| tree.attributes(*o1).iter().position(|(n, _)| *n == name);
                    index(n1).cmp(&index(n2))
                } else {
                    tree.compare_document_position(*o1, *o2)
                }
            }
            (XPathNode::Attribute { owner, .. }, XPathNode::Node(n)) => attr_vs_node(*owner, *n),
            (XPathNode::Node(n), XPathNode::Attribute { owner, .. }) => attr_vs_node(*owner, *n).reverse(),
        }
    }

    // --- Conversions ---

    fn to_boolean(&self, value: &Value) -> bool {
        match value {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::String(s) => parse_number(s),
            Value::NodeSet(_) => parse_number(&self.to_string(value)),
        }
    }

    fn to_string(&self, value: &Value) -> String {
        match value {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|n| n.string_value(self.tree))
                .unwrap_or_default(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::NodeSet(a), Value::NodeSet(b)) => a.iter().any(|x| {
                let sx = Value::String(x.string_value(self.tree));
                b.iter()
                    .any(|y| self.compare_scalars(op, &sx, &Value::String(y.string_value(self.tree))))
            }),
            (Value::NodeSet(a), Value::Boolean(_)) => {
                self.compare_scalars(op, &Value::Boolean(!a.is_empty()), right)
            }
            (Value::Boolean(_), Value::NodeSet(b)) => {
                self.compare_scalars(op, left, &Value::Boolean(!b.is_empty()))
            }
            (Value::NodeSet(a), other) => a
                .iter()
                .any(|x| self.compare_scalars(op, &Value::String(x.string_value(self.tree)), other)),
            (other, Value::NodeSet(b)) => b
                .iter()
                .any(|y| self.compare_scalars(op, other, &Value::String(y.string_value(self.tree)))),
            _ => self.compare_scalars(op, left, right),
        }
    }

    fn compare_scalars(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match op {
            BinaryOp::Eq | BinaryOp::Neq => {
                let equal = match (left, right) {
                    (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
                        self.to_boolean(left) == self.to_boolean(right)
                    }
                    (Value::Number(_), _) | (_, Value::Number(_)) => {
                        self.to_number(left) == self.to_number(right)
                    }
                    _ => self.to_string(left) == self.to_string(right),
                };
                (op == BinaryOp::Eq) == equal
            }
            _ => {
                let (l, r) = (self.to_number(left), self.to_number(right));
                match op {
                    BinaryOp::Lt => l < r,
                    BinaryOp::Le => l <= r,
                    BinaryOp::Gt => l > r,
                    _ => l >= r,
                }
            }
        }
    }

    // --- Functions ---

    fn call(&self, name: &str, args: &[Expr], ctx: &Context) -> Result<Value, XPathError> {
        let arity = |min: usize, max: usize, expected: &'static str| {
            if args.len() < min || args.len() > max {
                Err(XPathError::Arity {
                    name: name.to_string(),
                    expected,
                })
            } else {
                Ok(())
            }
        };
        let string_arg = |i: usize| -> Result<String, XPathError> {
            match args.get(i) {
                Some(arg) => Ok(self.to_string(&self.eval(arg, ctx)?)),
                None => Ok(ctx.node.string_value(self.tree)),
            }
        };

        match name {
            "position" => {
                arity(0, 0, "0")?;
                Ok(Value::Number(ctx.position as f64))
            }
            "last" => {
                arity(0, 0, "0")?;
                Ok(Value::Number(ctx.size as f64))
            }
            "count" => {
                arity(1, 1, "1")?;
                match self.eval(&args[0], ctx)? {
                    Value::NodeSet(nodes) => Ok(Value::Number(nodes.len() as f64)),
                    _ => Err(XPathError::NotANodeSet),
                }
            }
            "contains" => {
                arity(2, 2, "2")?;
                Ok(Value::Boolean(string_arg(0)?.contains(string_arg(1)?.as_str())))
            }
            "starts-with" => {
                arity(2, 2, "2")?;
                Ok(Value::Boolean(string_arg(0)?.starts_with(string_arg(1)?.as_str())))
            }
            "substring-before" | "substring-after" => {
                arity(2, 2, "2")?;
                let (haystack, needle) = (string_arg(0)?, string_arg(1)?);
                let result = match haystack.find(&needle) {
                    Some(at) if name == "substring-before" => haystack[..at].to_string(),
                    Some(at) => haystack[at + needle.len()..].to_string(),
                    None => String::new(),
                };
                Ok(Value::String(result))
            }
            "concat" => {
                if args.len() < 2 {
                    return Err(XPathError::Arity {
                        name: name.to_string(),
                        expected: "2 or more",
                    });
                }
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&string_arg(i)?);
                }
                Ok(Value::String(out))
            }
            "normalize-space" => {
                arity(0, 1, "0 or 1")?;
                let s = string_arg(0)?;
                Ok(Value::String(s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")))
            }
            "string" => {
                arity(0, 1, "0 or 1")?;
                Ok(Value::String(string_arg(0)?))
            }
            "string-length" => {
                arity(0, 1, "0 or 1")?;
                Ok(Value::Number(string_arg(0)?.chars().count() as f64))
            }
            "translate" => {
                arity(3, 3, "3")?;
                let (s, from, to) = (string_arg(0)?, string_arg(1)?, string_arg(2)?);
                let to: Vec<char> = to.chars().collect();
                let out = s
                    .chars()
                    .filter_map(|c| match from.chars().position(|f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect();
                Ok(Value::String(out))
            }
            "not" => {
                arity(1, 1, "1")?;
                let value = self.eval(&args[0], ctx)?;
                Ok(Value::Boolean(!self.to_boolean(&value)))
            }
            "boolean" => {
                arity(1, 1, "1")?;
                let value = self.eval(&args[0], ctx)?;
                Ok(Value::Boolean(self.to_boolean(&value)))
            }
            "true" | "false" => {
                arity(0, 0, "0")?;
                Ok(Value::Boolean(name == "true"))
            }
            "number" => {
                arity(0, 1, "0 or 1")?;
                match args.first() {
                    Some(arg) => {
                        let value = self.eval(arg, ctx)?;
                        Ok(Value::Number(self.to_number(&value)))
                    }
                    None => Ok(Value::Number(parse_number(&ctx.node.string_value(self.tree)))),
                }
            }
            "sum" => {
                arity(1, 1, "1")?;
                match self.eval(&args[0], ctx)? {
                    Value::NodeSet(nodes) => Ok(Value::Number(
                        nodes
                            .iter()
                            .map(|n| parse_number(&n.string_value(self.tree)))
                            .sum(),
                    )),
                    _ => Err(XPathError::NotANodeSet),
                }
            }
            "floor" | "ceiling" | "round" => {
                arity(1, 1, "1")?;
                let n = self.to_number(&self.eval(&args[0], ctx)?);
                Ok(Value::Number(match name {
                    "floor" => n.floor(),
                    "ceiling" => n.ceil(),
                    _ => (n + 0.5).floor(),
                }))
            }
            "name" | "local-name" => {
                arity(0, 1, "0 or 1")?;
                let target = match args.first() {
                    Some(arg) => match self.eval(arg, ctx)? {
                        Value::NodeSet(nodes) => nodes.into_iter().next(),
                        _ => return Err(XPathError::NotANodeSet),
                    },
                    None => Some(ctx.node.clone()),
                };
                let name = match &target {
                    Some(XPathNode::Attribute { name, .. }) => name.clone(),
                    Some(XPathNode::Node(id)) => self.tree.tag_name(*id).unwrap_or("").to_string(),
                    None => String::new(),
                };
                Ok(Value::String(name))
            }
            _ => Err(XPathError::UnknownFunction(name.to_string())),
        }
    }
}

fn wrap(ids: impl Iterator<Item = NodeId>) -> Vec<XPathNode> {
    ids.map(XPathNode::Node).collect()
}

/// HTML names compare case-insensitively; a prefix on the test is ignored
fn name_matches(wanted: &str, actual: &str) -> bool {
    let local = wanted.rsplit(':').next().unwrap_or(wanted);
    local.eq_ignore_ascii_case(actual)
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
