//! Badge templates per layout.

use super::layout::BadgeKind;
use crate::tree::ElementSpec;

const WARNING_ICON_PATH: &str = "M1 21h22L12 2 1 21zm12-3h-2v-2h2v2zm0-4h-2v-4h2v4z";

/// Renders badge markup. The engine only relies on every rendered badge
/// carrying the configured badge class.
pub trait BadgeTemplates: Send + Sync {
    fn render(&self, kind: BadgeKind, badge_class: &str) -> ElementSpec;
}

/// Storefront look: warning-triangle icon plus a "Uses AI" label.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorefrontBadges;

fn warning_icon() -> ElementSpec {
    ElementSpec::new("svg")
        .with_attr("viewBox", "0 0 24 24")
        .with_class("_3LecBjgbnwvS6bCFqxs6SC")
        .with_child(
            ElementSpec::new("path")
                .with_attr("fill", "currentColor")
                .with_attr("d", WARNING_ICON_PATH),
        )
}

impl BadgeTemplates for StorefrontBadges {
    fn render(&self, kind: BadgeKind, badge_class: &str) -> ElementSpec {
        match kind {
            BadgeKind::Decorator => ElementSpec::new("span")
                .with_class(badge_class)
                .with_class("_2gxv9cF-4n9wq4yxruOTNl")
                .with_child(warning_icon())
                .with_text("Uses AI"),
            BadgeKind::SpotlightFlag => ElementSpec::new("div")
                .with_class("ds_flag")
                .with_class("ds_wishlist_flag")
                .with_class(badge_class)
                .with_child(warning_icon().with_attr("style", "height: 10px; margin-right: 4px;"))
                .with_text("USES AI\u{a0}\u{a0}"),
            BadgeKind::TabItem | BadgeKind::SearchRow => {
                ElementSpec::new("span").with_class(badge_class).with_text("USES AI")
            }
            BadgeKind::ImageOverlay => ElementSpec::new("span")
                .with_class(badge_class)
                .with_class("wishlist-badge")
                .with_text("USES AI"),
        }
    }
}
