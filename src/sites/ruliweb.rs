//! Ruliweb community boards (`bbs.ruliweb.com`)

use crate::sites::rules::{
    CommentIdRule, CommentRules, CommentShape, FieldSelector, IdRule, ListingRules,
    MetadataRules, SiteRules,
};
use crate::sites::Site;

pub(super) static RULES: SiteRules = SiteRules {
    site: Site::Ruliweb,
    host_patterns: &["*.ruliweb.com"],
    post_id: &[IdRule::PathAfter("read")],
    post_ready: "div.board_main_view",
    metadata: MetadataRules {
        title: FieldSelector::text("h4.subject span.subject_inner_text"),
        author: FieldSelector::text("div.user_view strong.nick"),
        date: FieldSelector::text("div.user_view span.regdate"),
        views: Some(FieldSelector::text("div.user_view span.hit")),
        upvotes: Some(FieldSelector::text("div.like_wrapper span.like_value")),
        comment_count: Some(FieldSelector::text("div.comment_count_wrapper strong.num")),
    },
    body: "div.view_content article",
    comments: CommentRules {
        item: "table.comment_table tr.comment_element",
        id: CommentIdRule {
            attr: "id",
            strip_prefixes: &["ct_"],
        },
        author: FieldSelector::text("div.user a.nick"),
        date: FieldSelector::text("span.time"),
        text: FieldSelector::text("div.text_wrapper span.text"),
        shape: CommentShape::ReplyClass("child"),
        hides_deleted: true,
    },
    listing: ListingRules {
        anchors: "table.board_list_table tr.table_body td.subject a.deco",
        page_param: "page",
        first_page: 1,
        ready: "table.board_list_table",
    },
    block_markers: &["cf-browser-verification", "비정상적인 접근"],
};
