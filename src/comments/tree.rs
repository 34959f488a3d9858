//! Reconstruction of comment threads from flat comment lists.
//!
//! Comments are stored flat with an optional `parent_id`. [`build_forest`]
//! turns such a list into an ordered forest of [`CommentNode`]s in linear
//! time. The builder never recurses, so arbitrarily deep reply chains are
//! safe, and it tolerates malformed data: orphans become roots and cycles
//! are broken rather than looping forever.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::db::Comment;

/// A comment together with its direct replies, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of direct replies.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes below this one, at any depth.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CommentNode> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Build the reply forest for one post's comments.
///
/// Input order is preserved both among roots and within every child list.
/// A comment becomes a root when it has no parent, when its parent is not in
/// `comments`, or when it names itself as parent. Comments caught in a
/// parent cycle are promoted to roots in input order, so every input record
/// ends up in exactly one node.
#[must_use]
pub fn build_forest(comments: &[Comment]) -> Vec<CommentNode> {
    let n = comments.len();
    if n == 0 {
        return Vec::new();
    }

    // Pass 1: id -> index. The first record wins if ids repeat.
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(n);
    for (i, comment) in comments.iter().enumerate() {
        index.entry(comment.id).or_insert(i);
    }

    // Pass 2: attach every record to its parent's list or to the roots.
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut parent_of: Vec<Option<usize>> = vec![None; n];
    let mut roots: Vec<usize> = Vec::new();
    for (i, comment) in comments.iter().enumerate() {
        match comment.parent_id.and_then(|p| index.get(&p).copied()) {
            Some(parent) if parent != i => {
                children_of[parent].push(i);
                parent_of[i] = Some(parent);
            }
            _ => roots.push(i),
        }
    }

    // Descent with an explicit stack. `placed` is the visited guard: a
    // record reached a second time is skipped.
    let mut placed = vec![false; n];
    let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut preorder: Vec<usize> = Vec::with_capacity(n);
    let mut forest_roots: Vec<usize> = Vec::new();

    for &root in &roots {
        descend(root, &children_of, &mut placed, &mut tree_children, &mut preorder);
        forest_roots.push(root);
    }

    // Whatever is still unplaced is a cycle or hangs off one. Follow parent
    // links from it until an index repeats: that index is on the cycle, and
    // starting there keeps every tail under its real parent.
    let mut walked = vec![usize::MAX; n];
    for i in 0..n {
        if placed[i] {
            continue;
        }
        let mut j = i;
        while walked[j] != i {
            walked[j] = i;
            match parent_of[j] {
                Some(parent) => j = parent,
                None => break,
            }
        }
        if !placed[j] {
            descend(j, &children_of, &mut placed, &mut tree_children, &mut preorder);
            forest_roots.push(j);
        }
    }

    // Assemble bottom-up: in reverse preorder every node's descendants are
    // already built when the node itself is reached.
    let mut built: Vec<Option<CommentNode>> = vec![None; n];
    for &i in preorder.iter().rev() {
        let children = tree_children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(CommentNode {
            comment: comments[i].clone(),
            children,
        });
    }

    forest_roots
        .into_iter()
        .filter_map(|i| built[i].take())
        .collect()
}

/// Place `start` and everything reachable below it that is not yet placed.
fn descend(
    start: usize,
    children_of: &[Vec<usize>],
    placed: &mut [bool],
    tree_children: &mut [Vec<usize>],
    preorder: &mut Vec<usize>,
) {
    if placed[start] {
        return;
    }
    placed[start] = true;
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        preorder.push(i);
        for &child in &children_of[i] {
            if !placed[child] {
                placed[child] = true;
                tree_children[i].push(child);
                stack.push(child);
            }
        }
    }
}

/// Total number of nodes in a forest.
#[must_use]
pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest.len() + forest.iter().map(CommentNode::descendant_count).sum::<usize>()
}

/// Find the node for `id` anywhere in the forest.
#[must_use]
pub fn find_node(forest: &[CommentNode], id: i64) -> Option<&CommentNode> {
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        if node.comment.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

/// Ids of `id` and every comment that transitively replies to it.
///
/// Works on the flat list so it can drive local removal after a delete.
#[must_use]
pub fn descendant_ids(comments: &[Comment], id: i64) -> HashSet<i64> {
    let mut replies: HashMap<i64, Vec<i64>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = comment.parent_id {
            replies.entry(parent).or_default().push(comment.id);
        }
    }

    let mut found = HashSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if !found.insert(current) {
            continue;
        }
        if let Some(children) = replies.get(&current) {
            stack.extend(children.iter().copied());
        }
    }
    found
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            post_id: 1,
            author_id: 10,
            parent_id,
            content: format!("comment {id}"),
            created_at: "2024-01-15 12:00:00".to_string(),
            updated_at: "2024-01-15 12:00:00".to_string(),
            author_name: "alice".to_string(),
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<i64> {
        nodes.iter().map(|n| n.comment.id).collect()
    }

    fn all_ids(forest: &[CommentNode]) -> Vec<i64> {
        let mut out = Vec::new();
        let mut stack: Vec<&CommentNode> = forest.iter().collect();
        while let Some(node) = stack.pop() {
            out.push(node.comment.id);
            stack.extend(node.children.iter());
        }
        out.sort_unstable();
        out
    }

    #[test]
    fn test_empty_input_gives_empty_forest() {
        assert!(build_forest(&[]).is_empty());
    }

    #[test]
    fn test_root_and_reply_scenario() {
        let comments = vec![comment(1, None), comment(2, Some(1)), comment(3, None)];
        let forest = build_forest(&comments);

        assert_eq!(ids(&forest), vec![1, 3]);
        assert_eq!(ids(&forest[0].children), vec![2]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_child_listed_before_parent_is_still_attached() {
        let comments = vec![comment(2, Some(1)), comment(1, None)];
        let forest = build_forest(&comments);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].children), vec![2]);
    }

    #[test]
    fn test_sibling_order_follows_input_order() {
        let comments = vec![
            comment(1, None),
            comment(5, Some(1)),
            comment(3, Some(1)),
            comment(4, Some(1)),
        ];
        let forest = build_forest(&comments);
        assert_eq!(ids(&forest[0].children), vec![5, 3, 4]);
    }

    #[test]
    fn test_orphan_is_promoted_to_root() {
        let comments = vec![comment(1, None), comment(2, Some(99))];
        let forest = build_forest(&comments);
        assert_eq!(ids(&forest), vec![1, 2]);
    }

    #[test]
    fn test_self_parent_becomes_root() {
        let forest = build_forest(&[comment(7, Some(7))]);
        assert_eq!(ids(&forest), vec![7]);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_two_node_cycle_terminates_with_each_once() {
        let comments = vec![comment(1, Some(2)), comment(2, Some(1))];
        let forest = build_forest(&comments);

        assert_eq!(count_nodes(&forest), 2);
        assert_eq!(all_ids(&forest), vec![1, 2]);
        // The first record in input order breaks the cycle.
        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].children), vec![2]);
    }

    #[test]
    fn test_cycle_with_tail_places_everything_once() {
        // 1 -> 2 -> 3 -> 1 forms a loop, 4 replies to 3, 5 is a normal root.
        let comments = vec![
            comment(4, Some(3)),
            comment(1, Some(3)),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(5, None),
        ];
        let forest = build_forest(&comments);

        assert_eq!(count_nodes(&forest), comments.len());
        assert_eq!(all_ids(&forest), vec![1, 2, 3, 4, 5]);
        assert_eq!(forest[0].comment.id, 5);
        // The cycle is broken at 3, so the tail stays under its parent.
        assert_eq!(ids(&forest), vec![5, 3]);
        let three = find_node(&forest, 3).expect("3 is placed");
        assert_eq!(ids(&three.children), vec![4, 1]);
    }

    #[test]
    fn test_tail_listed_first_stays_under_cycle_parent() {
        let comments = vec![
            comment(4, Some(3)),
            comment(1, Some(3)),
            comment(2, Some(1)),
            comment(3, Some(2)),
        ];
        let forest = build_forest(&comments);

        assert_eq!(count_nodes(&forest), 4);
        assert_eq!(ids(&forest), vec![3]);
        for c in &comments {
            let parent = c.parent_id.expect("every record has a parent");
            if c.id == 3 {
                continue; // cycle entry point
            }
            let parent = find_node(&forest, parent).expect("parent is in the forest");
            assert!(ids(&parent.children).contains(&c.id), "{} detached", c.id);
        }
    }

    #[test]
    fn test_every_child_listed_exactly_once_under_its_parent() {
        let comments = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(1)),
            comment(4, Some(2)),
            comment(5, Some(4)),
            comment(6, None),
            comment(7, Some(6)),
        ];
        let forest = build_forest(&comments);
        assert_eq!(count_nodes(&forest), comments.len());

        for c in &comments {
            if let Some(p) = c.parent_id {
                let parent = find_node(&forest, p).expect("parent is in the forest");
                let hits = parent
                    .children
                    .iter()
                    .filter(|n| n.comment.id == c.id)
                    .count();
                assert_eq!(hits, 1, "comment {} under parent {p}", c.id);
            }
        }
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 5_000;
        let comments: Vec<Comment> = (1..=depth)
            .map(|id| comment(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let forest = build_forest(&comments);

        assert_eq!(forest.len(), 1);
        assert_eq!(count_nodes(&forest), depth as usize);
        assert!(find_node(&forest, depth).is_some());
    }

    #[test]
    fn test_input_is_left_untouched() {
        let comments = vec![comment(1, None), comment(2, Some(1))];
        let before = comments.clone();
        let _ = build_forest(&comments);
        assert_eq!(comments, before);
    }

    #[test]
    fn test_descendant_ids_covers_whole_subtree() {
        let comments = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, None),
        ];
        let mut found: Vec<i64> = descendant_ids(&comments, 1).into_iter().collect();
        found.sort_unstable();
        assert_eq!(found, vec![1, 2, 3]);
    }

    #[test]
    fn test_descendant_ids_survives_cycles() {
        let comments = vec![comment(1, Some(2)), comment(2, Some(1))];
        assert_eq!(descendant_ids(&comments, 1).len(), 2);
    }

    #[test]
    fn test_reply_and_descendant_counts() {
        let comments = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(1)),
        ];
        let forest = build_forest(&comments);
        assert_eq!(forest[0].reply_count(), 2);
        assert_eq!(forest[0].descendant_count(), 3);
    }
}
