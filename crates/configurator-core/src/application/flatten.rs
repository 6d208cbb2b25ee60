//! Flattening the configuration tree into selectable nodes.
//!
//! Node-selection controls need a flat list of every feature node, however
//! deeply nested.  The walk uses an explicit work list rather than recursion:
//!
//! ```text
//! stack = every step's features, in order
//! while let Some(node) = stack.pop():
//!     emit node
//!     push node.features
//! ```
//!
//! The resulting order is a depth-first walk that visits later siblings
//! first.  Callers must not rely on it; only membership is guaranteed.

use crate::domain::configuration::{Configuration, FeatureNode};

/// Every feature node reachable from any step of `configuration`.
///
/// Returns `None` when there is no configuration.  Each node of the tree
/// appears exactly once.
pub fn flatten_nodes(configuration: Option<&Configuration>) -> Option<Vec<&FeatureNode>> {
    let configuration = configuration?;

    let mut stack: Vec<&FeatureNode> = configuration
        .steps
        .iter()
        .flat_map(|step| step.features.iter())
        .collect();
    let mut nodes = Vec::with_capacity(stack.len());

    while let Some(node) = stack.pop() {
        nodes.push(node);
        stack.extend(node.features.iter());
    }

    Some(nodes)
}

/// The entries of `nodes` whose feature type is "image", in the same order.
///
/// Absent input yields an empty list.
pub fn image_nodes<'a>(nodes: Option<&[&'a FeatureNode]>) -> Vec<&'a FeatureNode> {
    nodes
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|node| node.is_image())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configuration::{FeatureType, Step};

    fn node(id: &str, feature_type: i64, children: Vec<FeatureNode>) -> FeatureNode {
        FeatureNode {
            id: id.to_string(),
            name: Some(format!("Node {id}")),
            feature_type: Some(FeatureType(feature_type)),
            features: children,
            ..Default::default()
        }
    }

    fn config(steps: Vec<Vec<FeatureNode>>) -> Configuration {
        Configuration {
            id: Some("c-1".to_string()),
            steps: steps
                .into_iter()
                .map(|features| Step { features, ..Default::default() })
                .collect(),
            ..Default::default()
        }
    }

    fn ids(nodes: &[&FeatureNode]) -> Vec<String> {
        let mut ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_no_configuration_flattens_to_none() {
        assert!(flatten_nodes(None).is_none());
    }

    #[test]
    fn test_configuration_without_steps_flattens_to_empty() {
        let cfg = config(vec![]);
        assert_eq!(flatten_nodes(Some(&cfg)).unwrap().len(), 0);
    }

    #[test]
    fn test_flat_steps_yield_every_node() {
        let cfg = config(vec![
            vec![node("a", 1, vec![]), node("b", 1, vec![])],
            vec![node("c", 1, vec![])],
        ]);

        let nodes = flatten_nodes(Some(&cfg)).unwrap();

        assert_eq!(ids(&nodes), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_nested_features_are_included_exactly_once() {
        // Arrange: three levels deep under one root, plus a sibling step
        let cfg = config(vec![
            vec![node(
                "root",
                0,
                vec![node("child1", 0, vec![node("grandchild", 4, vec![])]), node("child2", 0, vec![])],
            )],
            vec![node("other", 4, vec![])],
        ]);

        // Act
        let nodes = flatten_nodes(Some(&cfg)).unwrap();

        // Assert
        assert_eq!(nodes.len(), cfg.node_count());
        assert_eq!(ids(&nodes), vec!["child1", "child2", "grandchild", "other", "root"]);
    }

    #[test]
    fn test_walk_pops_from_the_end_of_the_work_list() {
        // Documented behaviour of the work-list walk; not a caller contract.
        let cfg = config(vec![vec![node("a", 1, vec![node("a1", 1, vec![])]), node("b", 1, vec![])]]);

        let order: Vec<&str> = flatten_nodes(Some(&cfg))
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();

        assert_eq!(order, vec!["b", "a", "a1"]);
    }

    #[test]
    fn test_image_nodes_filters_feature_type_four() {
        let cfg = config(vec![vec![
            node("text", 2, vec![node("logo", 4, vec![])]),
            node("photo", 4, vec![]),
            node("option", 1, vec![]),
        ]]);
        let nodes = flatten_nodes(Some(&cfg)).unwrap();

        let images = image_nodes(Some(nodes.as_slice()));

        assert_eq!(ids(&images), vec!["logo", "photo"]);
        assert!(images.iter().all(|n| n.is_image()));
    }

    #[test]
    fn test_image_nodes_preserve_source_order() {
        let cfg = config(vec![vec![
            node("i1", 4, vec![]),
            node("x", 1, vec![]),
            node("i2", 4, vec![]),
            node("i3", 4, vec![]),
        ]]);
        let nodes = flatten_nodes(Some(&cfg)).unwrap();

        let images = image_nodes(Some(nodes.as_slice()));

        let expected: Vec<&str> = nodes.iter().filter(|n| n.is_image()).map(|n| n.id.as_str()).collect();
        let actual: Vec<&str> = images.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_image_nodes_of_none_is_empty() {
        assert!(image_nodes(None).is_empty());
    }

    #[test]
    fn test_node_without_feature_type_is_not_an_image() {
        let cfg = config(vec![vec![FeatureNode { id: "plain".to_string(), ..Default::default() }]]);
        let nodes = flatten_nodes(Some(&cfg)).unwrap();

        assert!(image_nodes(Some(nodes.as_slice())).is_empty());
    }
}
