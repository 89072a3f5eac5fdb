//! DC Inside galleries (`gall.dcinside.com`)
//!
//! Replies are rendered in a `ul.reply_list` placed after their parent
//! comment, so depth is counted from enclosing reply lists.

use crate::sites::rules::{
    CommentIdRule, CommentRules, CommentShape, FieldSelector, IdRule, ListingRules,
    MetadataRules, SiteRules,
};
use crate::sites::Site;

pub(super) static RULES: SiteRules = SiteRules {
    site: Site::DcInside,
    host_patterns: &["*.dcinside.com"],
    // Article numbers are only unique within a gallery
    post_id: &[IdRule::ScopedQueryParam {
        scope: "id",
        key: "no",
    }],
    post_ready: "div.view_content_wrap",
    metadata: MetadataRules {
        title: FieldSelector::text("span.title_subject"),
        author: FieldSelector::attr("div.gall_writer", "data-nick"),
        date: FieldSelector::attr("span.gall_date", "title"),
        views: Some(FieldSelector::text("span.gall_count")),
        upvotes: Some(FieldSelector::text("p.up_num")),
        comment_count: Some(FieldSelector::text("span.gall_comment")),
    },
    body: "div.write_div",
    comments: CommentRules {
        item: "ul.cmt_list li.ub-content",
        id: CommentIdRule {
            attr: "id",
            strip_prefixes: &["comment_li_", "reply_li_"],
        },
        author: FieldSelector::attr("span.gall_writer", "data-nick"),
        date: FieldSelector::text("span.date_time"),
        text: FieldSelector::text("p.usertxt"),
        shape: CommentShape::Nested("ul.reply_list"),
        hides_deleted: true,
    },
    listing: ListingRules {
        anchors: "tr.ub-content td.gall_tit > a:first-child",
        page_param: "page",
        first_page: 1,
        ready: "table.gall_list",
    },
    block_markers: &[
        "cf-browser-verification",
        "접근이 제한되었습니다",
        "정상적인 접근이 아닙니다",
    ],
};
