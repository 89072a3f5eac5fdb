//! Clien boards (`www.clien.net`)
//!
//! Listing pages are addressed by a zero-based `po` parameter.

use crate::sites::rules::{
    CommentIdRule, CommentRules, CommentShape, FieldSelector, IdRule, ListingRules,
    MetadataRules, SiteRules,
};
use crate::sites::Site;

pub(super) static RULES: SiteRules = SiteRules {
    site: Site::Clien,
    host_patterns: &["*.clien.net"],
    post_id: &[IdRule::LastPathSegment],
    post_ready: "div.post_view",
    metadata: MetadataRules {
        title: FieldSelector::text("h3.post_subject > span"),
        author: FieldSelector::text("div.post_info span.nickname"),
        date: FieldSelector::text("div.post_author span.view_count.date"),
        views: Some(FieldSelector::text("div.post_author span.view_count strong")),
        upvotes: Some(FieldSelector::text("div.post_symph span")),
        comment_count: Some(FieldSelector::text("div.comment_head span.comment_count")),
    },
    body: "div.post_article",
    comments: CommentRules {
        item: "div.comment div.comment_row",
        id: CommentIdRule {
            attr: "data-comment-sn",
            strip_prefixes: &[],
        },
        author: FieldSelector::text("span.nickname"),
        date: FieldSelector::text("span.timestamp"),
        text: FieldSelector::text("div.comment_view"),
        shape: CommentShape::ReplyClass("re"),
        hides_deleted: false,
    },
    listing: ListingRules {
        anchors: "div.list_content div.list_item a.list_subject",
        page_param: "po",
        first_page: 0,
        ready: "div.list_content",
    },
    block_markers: &["cf-browser-verification", "접근이 차단되었습니다"],
};
