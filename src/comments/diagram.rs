//! Mermaid flowchart export of a post's discussion.

use std::collections::HashSet;

use crate::comments::tree::{build_forest, CommentNode};
use crate::constants::DIAGRAM_LABEL_MAX_CHARS;
use crate::db::Comment;

/// Characters with meaning in Mermaid flowchart syntax.
const MERMAID_RESERVED: &[char] = &[
    '[', ']', '(', ')', '{', '}', '<', '>', '"', '\'', '|', '#', ';', '`',
];

const POST_NODE_ID: &str = "post";
const EMPTY_NODE_ID: &str = "empty";

/// The post a diagram is rooted at.
#[derive(Debug, Clone, Copy)]
pub struct DiagramPost<'a> {
    pub title: &'a str,
    pub author_name: &'a str,
}

/// Visual class of a diagram node, decided by depth alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Post,
    RootComment,
    ReplyComment,
}

impl NodeClass {
    #[must_use]
    pub const fn for_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Post,
            1 => Self::RootComment,
            _ => Self::ReplyComment,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "postNode",
            Self::RootComment => "rootComment",
            Self::ReplyComment => "replyComment",
        }
    }

    const ALL: [Self; 3] = [Self::Post, Self::RootComment, Self::ReplyComment];
}

/// Render the post and its comments as a Mermaid `graph TD` description.
///
/// The post is node `post`, each comment is node `c<id>`, and every reply
/// relation is an edge from parent to child. Root comments hang off the
/// post. Output is deterministic for a given input order.
#[must_use]
pub fn generate_diagram(post: &DiagramPost<'_>, comments: &[Comment]) -> String {
    let mut out = String::from("graph TD\n");
    out.push_str("    classDef postNode fill:#fdf2f8,stroke:#ec4899,stroke-width:2px\n");
    out.push_str("    classDef rootComment fill:#eff6ff,stroke:#3b82f6\n");
    out.push_str("    classDef replyComment fill:#f4f4f5,stroke:#a1a1aa\n");

    if comments.is_empty() {
        out.push_str(&format!("    {EMPTY_NODE_ID}[\"No comments yet\"]\n"));
        return out;
    }

    let forest = build_forest(comments);

    let mut nodes: Vec<(String, usize)> = Vec::with_capacity(comments.len() + 1);
    let mut node_lines: Vec<String> = Vec::with_capacity(comments.len() + 1);
    let mut edge_lines: Vec<String> = Vec::with_capacity(comments.len());

    let post_label = label(&format!("{} by {}", post.title, post.author_name));
    node_lines.push(format!("    {POST_NODE_ID}[\"{post_label}\"]"));
    nodes.push((POST_NODE_ID.to_string(), 0));

    let mut processed: HashSet<i64> = HashSet::with_capacity(comments.len());
    let mut stack: Vec<(&CommentNode, String, usize)> = forest
        .iter()
        .rev()
        .map(|root| (root, POST_NODE_ID.to_string(), 1))
        .collect();

    while let Some((node, parent, depth)) = stack.pop() {
        let comment = &node.comment;
        if !processed.insert(comment.id) {
            continue;
        }

        let id = node_id(comment.id);
        let text = label(&format!("{}: {}", comment.author_name, comment.content));
        node_lines.push(format!("    {id}[\"{text}\"]"));
        edge_lines.push(format!("    {parent} --> {id}"));

        for child in node.children.iter().rev() {
            stack.push((child, id.clone(), depth + 1));
        }
        nodes.push((id, depth));
    }

    for line in node_lines.iter().chain(edge_lines.iter()) {
        out.push_str(line);
        out.push('\n');
    }

    // Classes are applied over the already emitted node set.
    for class in NodeClass::ALL {
        let members: Vec<&str> = nodes
            .iter()
            .filter(|(_, depth)| NodeClass::for_depth(*depth) == class)
            .map(|(id, _)| id.as_str())
            .collect();
        if !members.is_empty() {
            out.push_str(&format!("    class {} {}\n", members.join(","), class.as_str()));
        }
    }

    out
}

/// Diagram node identifier for a comment id.
fn node_id(id: i64) -> String {
    format!("c{id}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Strip reserved characters, collapse whitespace, then truncate.
fn label(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !MERMAID_RESERVED.contains(c))
        .map(|c| if c.is_whitespace() || c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return "empty".to_string();
    }
    truncate_label(&collapsed, DIAGRAM_LABEL_MAX_CHARS)
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::tree::tests::comment;

    const POST: DiagramPost<'static> = DiagramPost {
        title: "Hello world",
        author_name: "bob",
    };

    fn node_labels(diagram: &str) -> Vec<String> {
        diagram
            .lines()
            .filter_map(|line| {
                let start = line.find("[\"")?;
                let end = line.rfind("\"]")?;
                Some(line[start + 2..end].to_string())
            })
            .collect()
    }

    fn edges(diagram: &str) -> Vec<String> {
        diagram
            .lines()
            .filter(|l| l.contains("-->"))
            .map(|l| l.trim().to_string())
            .collect()
    }

    #[test]
    fn test_empty_discussion_has_placeholder_and_no_edges() {
        let diagram = generate_diagram(&POST, &[]);

        assert!(diagram.starts_with("graph TD"));
        assert!(diagram.contains("empty[\"No comments yet\"]"));
        assert!(edges(&diagram).is_empty());
    }

    #[test]
    fn test_edges_follow_reply_relations() {
        let comments = vec![comment(1, None), comment(2, Some(1)), comment(3, None)];
        let diagram = generate_diagram(&POST, &comments);

        assert_eq!(
            edges(&diagram),
            vec!["post --> c1", "c1 --> c2", "post --> c3"]
        );
    }

    #[test]
    fn test_classes_by_depth() {
        let comments = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, None),
        ];
        let diagram = generate_diagram(&POST, &comments);

        assert!(diagram.contains("class post postNode"));
        assert!(diagram.contains("class c1,c4 rootComment"));
        assert!(diagram.contains("class c2,c3 replyComment"));
    }

    #[test]
    fn test_reserved_characters_never_reach_labels() {
        let mut c = comment(1, None);
        c.content = r#"see [this](http://x) {now} "quoted" <b>|pipe|</b>"#.to_string();
        c.author_name = "eve[admin]".to_string();
        let diagram = generate_diagram(&POST, &[c]);

        for label in node_labels(&diagram) {
            for ch in MERMAID_RESERVED {
                assert!(!label.contains(*ch), "label {label:?} contains {ch:?}");
            }
        }
    }

    #[test]
    fn test_long_labels_are_truncated_with_marker() {
        let mut c = comment(1, None);
        c.content = "x".repeat(200);
        let diagram = generate_diagram(&POST, &[c]);

        let labels = node_labels(&diagram);
        let comment_label = &labels[1];
        assert!(comment_label.ends_with("..."));
        assert_eq!(comment_label.chars().count(), DIAGRAM_LABEL_MAX_CHARS + 3);
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        let text = "é".repeat(50);
        let truncated = truncate_label(&text, 40);
        assert_eq!(truncated.chars().count(), 43);
    }

    #[test]
    fn test_short_label_is_kept() {
        assert_eq!(label("  hi \n there "), "hi there");
    }

    #[test]
    fn test_blank_label_fallback_has_no_reserved_chars() {
        let fallback = label("[]");
        assert_eq!(fallback, "empty");
        assert!(!fallback.chars().any(|c| MERMAID_RESERVED.contains(&c)));
    }

    #[test]
    fn test_each_comment_emitted_once_with_cycles() {
        let comments = vec![comment(1, Some(2)), comment(2, Some(1))];
        let diagram = generate_diagram(&POST, &comments);

        assert_eq!(diagram.matches("c1[\"").count(), 1);
        assert_eq!(diagram.matches("c2[\"").count(), 1);
        assert_eq!(edges(&diagram).len(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let comments = vec![comment(3, None), comment(1, Some(3)), comment(2, Some(3))];
        assert_eq!(
            generate_diagram(&POST, &comments),
            generate_diagram(&POST, &comments)
        );
    }

    #[test]
    fn test_negative_ids_are_safe_identifiers() {
        assert_eq!(node_id(-5), "c_5");
    }
}
