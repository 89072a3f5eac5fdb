//! FM Korea (`www.fmkorea.com`)

use crate::sites::rules::{
    CommentIdRule, CommentRules, CommentShape, FieldSelector, IdRule, ListingRules,
    MetadataRules, SiteRules,
};
use crate::sites::Site;

pub(super) static RULES: SiteRules = SiteRules {
    site: Site::FmKorea,
    host_patterns: &["*.fmkorea.com"],
    post_id: &[IdRule::QueryParam("document_srl"), IdRule::LastPathSegment],
    post_ready: "div.rd_body",
    metadata: MetadataRules {
        title: FieldSelector::text("h1.np_18px span.np_18px_span"),
        author: FieldSelector::text("div.btm_area a.member_plate"),
        date: FieldSelector::text("div.top_area span.date"),
        views: Some(FieldSelector::text("div.btm_area div.side.fr span:nth-child(1) b")),
        upvotes: Some(FieldSelector::text("div.btm_area div.side.fr span:nth-child(2) b")),
        comment_count: Some(FieldSelector::text("div.btm_area div.side.fr span:nth-child(3) b")),
    },
    body: "div.rd_body article div.xe_content",
    comments: CommentRules {
        item: "ul.fdb_lst_ul > li.fdb_itm",
        id: CommentIdRule {
            attr: "id",
            strip_prefixes: &["comment_"],
        },
        author: FieldSelector::text("div.meta a.member_plate"),
        date: FieldSelector::text("div.meta span.date"),
        text: FieldSelector::text("div.comment-content div.xe_content"),
        // Each reply level adds 2% of left margin
        shape: CommentShape::Indent {
            property: "margin-left",
            step: 2.0,
        },
        hides_deleted: false,
    },
    listing: ListingRules {
        anchors: "table.bd_lst td.title > a:first-child, li.li h3.title > a",
        page_param: "page",
        first_page: 1,
        ready: "div.bd_lst_wrp",
    },
    block_markers: &["에펨코리아 보안 시스템", "cf-browser-verification"],
};
