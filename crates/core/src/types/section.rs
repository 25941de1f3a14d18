//! Built-in site sections.
//!
//! The marketing site is organized into fixed top-level sections. Their
//! slugs double as the content keys of each section's page copy.

/// A top-level site section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSection {
    /// Menu label shown to visitors.
    pub label: &'static str,
    /// URL slug and content key.
    pub slug: &'static str,
}

/// Sections in menu order.
pub const DEFAULT_SECTIONS: &[SiteSection] = &[
    SiteSection { label: "회사소개", slug: "company" },
    SiteSection { label: "콤프레샤", slug: "compressor" },
    SiteSection { label: "에어크리닝시스템", slug: "air-cleaning" },
    SiteSection { label: "발전기", slug: "generator" },
    SiteSection { label: "친환경에너지", slug: "eco-energy" },
    SiteSection { label: "산업기계", slug: "industrial" },
    SiteSection { label: "거래실적", slug: "records" },
    SiteSection { label: "특가판매", slug: "special-sale" },
    SiteSection { label: "제품AS", slug: "as" },
    SiteSection { label: "고객센터", slug: "support" },
];

/// The built-in allow-list for the admin role: the home page plus every
/// section page.
#[must_use]
pub fn default_allowed_keys() -> Vec<String> {
    std::iter::once(super::DEFAULT_CONTENT_KEY)
        .chain(DEFAULT_SECTIONS.iter().map(|s| s.slug))
        .map(str::to_owned)
        .collect()
}
