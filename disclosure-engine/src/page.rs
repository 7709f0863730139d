//! Page routing: which surface a storefront URL belongs to.

use url::Url;

use crate::types::EntryId;

/// Kind of storefront page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// Any storefront page that lists tiles; the badge engine runs here
    Listing,
    /// An entry's own detail page, `/app/<id>`; the banner runs here
    EntryDetail(EntryId),
    /// Off-storefront or unparseable
    Other,
}

impl PageKind {
    /// Classify `url` against the storefront origin `base`.
    pub fn classify(url: &str, base: &str) -> Self {
        let (Ok(url), Ok(base)) = (Url::parse(url), Url::parse(base)) else {
            return PageKind::Other;
        };
        if url.scheme() != base.scheme() || url.host_str() != base.host_str() {
            return PageKind::Other;
        }

        let mut segments = url.path_segments().into_iter().flatten();
        if let (Some("app"), Some(id)) = (segments.next(), segments.next()) {
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                if let Some(id) = EntryId::parse(id) {
                    return PageKind::EntryDetail(id);
                }
            }
        }
        PageKind::Listing
    }

    pub fn entry(&self) -> Option<&EntryId> {
        match self {
            PageKind::EntryDetail(id) => Some(id),
            _ => None,
        }
    }
}
