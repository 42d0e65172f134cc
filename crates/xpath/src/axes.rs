//! Node collection along each axis, in proximity order.
//!
//! Forward axes yield document order, reverse axes (`parent`, `ancestor`,
//! `ancestor-or-self`, `preceding-sibling`) yield nearest node first, which is
//! the order positional predicates are counted in.

use crate::ast::Axis;
use crate::datasource::DataSourceNode;

pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N, out: &mut Vec<N>) {
    match axis {
        Axis::Child => out.extend(node.children()),
        Axis::Attribute => out.extend(node.attributes()),
        Axis::SelfAxis => out.push(node),
        Axis::Descendant => collect_descendants(node, out),
        Axis::DescendantOrSelf => {
            out.push(node);
            collect_descendants(node, out);
        }
        Axis::Parent => out.extend(node.parent()),
        Axis::Ancestor => collect_ancestors(node, out),
        Axis::AncestorOrSelf => {
            out.push(node);
            collect_ancestors(node, out);
        }
        Axis::FollowingSibling => collect_following_siblings(node, out),
        Axis::PrecedingSibling => collect_preceding_siblings(node, out),
    }
}

/// Depth-first, pre-order, so the result is in document order.
fn collect_descendants<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut children: Vec<N> = current.children().collect();
        children.reverse();
        stack.extend(children);
    }
}

fn collect_ancestors<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        out.push(p);
        current = p.parent();
    }
}

fn collect_following_siblings<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        out.extend(parent.children().skip_while(|s| *s != node).skip(1));
    }
}

fn collect_preceding_siblings<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        let before: Vec<N> = parent.children().take_while(|s| *s != node).collect();
        out.extend(before.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::mock::class_tree;

    fn ids<'a>(nodes: &[crate::datasource::mock::MockNode<'a>]) -> Vec<usize> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_children_exclude_attributes() {
        let tree = class_tree();
        let mut out = Vec::new();
        collect(Axis::Child, tree.node(1), &mut out);
        assert_eq!(ids(&out), vec![4, 9, 12, 14]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = class_tree();
        let mut out = Vec::new();
        collect(Axis::Descendant, tree.node(1), &mut out);
        assert_eq!(ids(&out), vec![4, 7, 8, 9, 12, 14]);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let tree = class_tree();
        let mut out = Vec::new();
        collect(Axis::AncestorOrSelf, tree.node(8), &mut out);
        assert_eq!(ids(&out), vec![8, 7, 4, 1, 0]);
    }

    #[test]
    fn test_siblings() {
        let tree = class_tree();
        let mut following = Vec::new();
        collect(Axis::FollowingSibling, tree.node(4), &mut following);
        assert_eq!(ids(&following), vec![9, 12, 14]);

        let mut preceding = Vec::new();
        collect(Axis::PrecedingSibling, tree.node(12), &mut preceding);
        assert_eq!(ids(&preceding), vec![9, 4]);
    }
}
