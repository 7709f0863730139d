//! The badge style sheet, kept as a single element in the document head.

use crate::tree::{DocumentTree, ElementSpec, NodeId};

pub fn stylesheet_id(badge_class: &str) -> String {
    format!("{badge_class}-styles")
}

fn stylesheet_css(c: &str) -> String {
    format!(
        r#"
.{c} {{
    background: #ff6b6b;
}}
.ds_flag.{c} {{
    background: linear-gradient(135deg, #ff6b6b 0%, #ff6b6b 100%);
    top: 52px;
    padding-left: 4px;
}}
.tab_item:has(> .{c}),
.search_result_row:has(> .{c}),
:has(> .{c}.wishlist-badge) {{
    position: relative;
}}
.tab_item > .{c},
.search_result_row > .{c},
.{c}.wishlist-badge {{
    position: absolute;
    top: 3px;
    left: 0px;
    font-size: 11px;
    padding: 3px 14px 3px 10px;
    color: #111;
    z-index: 10;
    line-height: 1;
    pointer-events: none;
    box-shadow: 0 0 10px rgba(0, 0, 0, .9);
    text-transform: uppercase;
}}
"#
    )
}

/// Insert the style sheet unless it is already present. Returns the
/// element either way, or `None` if the document has no head or body.
pub fn ensure_stylesheet(doc: &dyn DocumentTree, badge_class: &str) -> Option<NodeId> {
    let id = stylesheet_id(badge_class);
    if let Some(existing) = doc.element_by_id(&id) {
        return Some(existing);
    }

    let parent = doc.head().or_else(|| doc.body())?;
    let spec = ElementSpec::new("style")
        .with_id(id)
        .with_text(stylesheet_css(badge_class));
    doc.append_child(parent, &spec)
}
