use crate::sites::Site;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One canonical forum submission
///
/// Built in one piece by the extractor once every required field is known;
/// there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Identifier unique within `site`, derived from the URL or page
    pub post_id: String,

    /// Source forum
    pub site: Site,

    /// Final URL of the fetched page
    pub url: String,

    pub metadata: Metadata,

    /// Body elements in document order
    pub content: Vec<ContentElement>,

    /// Comments in document order
    pub comments: Vec<Comment>,

    /// Discrepancies tolerated during extraction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<ExtractionFlag>,
}

impl Post {
    /// The `(site, post_id)` pair stores deduplicate on
    pub fn dedup_key(&self) -> (Site, &str) {
        (self.site, &self.post_id)
    }

    /// Returns the comment a reply points to, if any
    pub fn parent_of(&self, comment: &Comment) -> Option<&Comment> {
        let parent_id = comment.parent_comment_id.as_deref()?;
        self.comments.iter().find(|c| c.comment_id == parent_id)
    }

    /// Concatenated text blocks, separated by blank lines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|element| match element {
                ContentElement::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Post header fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    /// Display date as the site renders it
    pub date: Option<String>,
    pub view_count: u64,
    pub up_count: u64,
    pub comment_count: u64,
}

/// A body element, tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentElement {
    Text { text: String },
    Image { src: String },
    Embed { src: String },
}

/// A comment or threaded reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub author: String,
    pub date: Option<String>,
    pub text: String,
    /// Nesting level, 0 for top-level comments
    pub depth: u32,
    /// Back-reference to the comment this one replies to
    pub parent_comment_id: Option<String>,
}

/// Display counters that are parsed best-effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    Views,
    Upvotes,
    Comments,
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Views => f.write_str("view_count"),
            Self::Upvotes => f.write_str("up_count"),
            Self::Comments => f.write_str("comment_count"),
        }
    }
}

/// Non-fatal discrepancies found while extracting a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum ExtractionFlag {
    /// A counter was present but did not parse; it was stored as 0
    UnparsedCount { field: CountField, raw: String },

    /// The site-reported comment count differs from the comments found
    CommentCountMismatch {
        reported: u64,
        extracted: u64,
        hides_deleted: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            post_id: "42".to_string(),
            site: Site::Clien,
            url: "https://www.clien.net/service/board/park/42".to_string(),
            metadata: Metadata {
                title: "제목".to_string(),
                author: "작성자".to_string(),
                date: None,
                view_count: 10,
                up_count: 1,
                comment_count: 2,
            },
            content: vec![
                ContentElement::Text {
                    text: "first".to_string(),
                },
                ContentElement::Image {
                    src: "https://img.example.com/a.png".to_string(),
                },
                ContentElement::Text {
                    text: "second".to_string(),
                },
            ],
            comments: vec![
                Comment {
                    comment_id: "1".to_string(),
                    author: "a".to_string(),
                    date: None,
                    text: "top".to_string(),
                    depth: 0,
                    parent_comment_id: None,
                },
                Comment {
                    comment_id: "2".to_string(),
                    author: "b".to_string(),
                    date: None,
                    text: "reply".to_string(),
                    depth: 1,
                    parent_comment_id: Some("1".to_string()),
                },
            ],
            flags: vec![],
        }
    }

    #[test]
    fn test_dedup_key() {
        let post = sample_post();
        assert_eq!(post.dedup_key(), (Site::Clien, "42"));
    }

    #[test]
    fn test_parent_lookup() {
        let post = sample_post();
        let reply = &post.comments[1];
        let parent = post.parent_of(reply).unwrap();
        assert_eq!(parent.comment_id, "1");
        assert!(post.parent_of(&post.comments[0]).is_none());
    }

    #[test]
    fn test_text_skips_media() {
        let post = sample_post();
        assert_eq!(post.text(), "first\n\nsecond");
    }

    #[test]
    fn test_content_serializes_with_kind_tag() {
        let element = ContentElement::Embed {
            src: "https://www.youtube.com/embed/x".to_string(),
        };
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["kind"], "embed");
        assert_eq!(json["src"], "https://www.youtube.com/embed/x");
    }

    #[test]
    fn test_flags_omitted_when_empty() {
        let json = serde_json::to_value(sample_post()).unwrap();
        assert!(json.get("flags").is_none());
        assert_eq!(json["site"], "clien");
    }
}
