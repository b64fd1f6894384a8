//! URL classification: detail page, hub page, listing page or irrelevant.
//!
//! Classification is a pure function of the URL. Checks run in a fixed
//! order: host, translated variant, hub/listing segment, path exclusions,
//! then the detail-page shape.

use regex::{Regex, RegexSet};
use url::Url;

use crate::error::{ExtractError, Result};
use crate::lexicon::SiteRules;
use crate::types::PageKind;

/// Classifies URLs against a single target site.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    domain: String,
    locale_prefixes: Vec<String>,
    hub_segment: String,
    listing_segment: String,
    detail: Regex,
    exclusions: RegexSet,
}

impl UrlClassifier {
    /// Compile the classifier from the site rules of a lexicon.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] if a pattern fails to compile.
    pub fn new(rules: &SiteRules) -> Result<Self> {
        let detail = Regex::new(&rules.detail_pattern)
            .map_err(|e| ExtractError::Lexicon(format!("invalid detail_pattern: {e}")))?;
        let exclusions = RegexSet::new(&rules.excluded_paths)
            .map_err(|e| ExtractError::Lexicon(format!("invalid excluded_paths: {e}")))?;
        Ok(Self {
            domain: rules.domain.to_ascii_lowercase(),
            locale_prefixes: rules.locale_prefixes.clone(),
            hub_segment: rules.hub_segment.clone(),
            listing_segment: rules.listing_segment.clone(),
            detail,
            exclusions,
        })
    }

    /// Returns `true` if the URL's host is the target domain or one of its
    /// subdomains.
    pub fn is_target_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        host == self.domain
            || host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Classify a parsed URL.
    pub fn classify(&self, url: &Url) -> PageKind {
        if !self.is_target_host(url) {
            tracing::trace!(%url, "classify: other host");
            return PageKind::Irrelevant;
        }

        let path = url.path();
        if self.is_translated(path) {
            tracing::trace!(%url, "classify: translated variant");
            return PageKind::Irrelevant;
        }
        if path.contains(self.hub_segment.as_str()) {
            return PageKind::HubSummaryPage;
        }
        if path.contains(self.listing_segment.as_str()) {
            return PageKind::ListingPage;
        }
        if let Some(index) = self.exclusions.matches(path).iter().next() {
            tracing::trace!(%url, pattern = %self.exclusions.patterns()[index], "classify: excluded path");
            return PageKind::Irrelevant;
        }
        if self.detail.is_match(path) {
            return PageKind::DetailPage;
        }

        tracing::trace!(%url, "classify: unrecognised shape");
        PageKind::Irrelevant
    }

    /// Parse and classify a raw URL string. Unparseable input is irrelevant.
    pub fn classify_str(&self, raw: &str) -> PageKind {
        Url::parse(raw).map_or(PageKind::Irrelevant, |url| self.classify(&url))
    }

    fn is_translated(&self, path: &str) -> bool {
        let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
        path.contains("/en/")
            || self
                .locale_prefixes
                .iter()
                .any(|prefix| prefix.as_str() == first_segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn classifier() -> UrlClassifier {
        let lexicon = Lexicon::builtin().expect("builtin lexicon");
        UrlClassifier::new(&lexicon.site).expect("classifier")
    }

    #[test]
    fn detail_page_with_and_without_trailing_slash() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/tokyo/A1311/A131105/13034566/"),
            PageKind::DetailPage
        );
        assert_eq!(
            c.classify_str("https://tabelog.com/tokyo/A1311/A131105/13034566"),
            PageKind::DetailPage
        );
    }

    #[test]
    fn ten_digit_ids_are_detail_pages() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/osaka/A2701/A270101/2701234567/"),
            PageKind::DetailPage
        );
    }

    #[test]
    fn nine_digit_ids_are_irrelevant() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/tokyo/A1311/A131105/130345661/"),
            PageKind::Irrelevant
        );
    }

    #[test]
    fn review_subpage_is_irrelevant() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/tokyo/A1311/A131105/13034566/review/123/"),
            PageKind::Irrelevant
        );
    }

    #[test]
    fn english_variant_is_irrelevant() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/en/tokyo/A1311/A131105/13034566/"),
            PageKind::Irrelevant
        );
    }

    #[test]
    fn other_locale_prefixes_are_irrelevant() {
        let c = classifier();
        for locale in ["cn", "tw", "kr"] {
            let url = format!("https://tabelog.com/{locale}/tokyo/A1311/A131105/13034566/");
            assert_eq!(c.classify_str(&url), PageKind::Irrelevant, "{url}");
        }
    }

    #[test]
    fn other_host_with_same_path_is_irrelevant() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://example.com/tokyo/A1311/A131105/13034566/"),
            PageKind::Irrelevant
        );
        assert_eq!(
            c.classify_str("https://tabelog.com.evil.example/tokyo/A1311/A131105/13034566/"),
            PageKind::Irrelevant
        );
        assert_eq!(
            c.classify_str("https://notabelog.com/tokyo/A1311/A131105/13034566/"),
            PageKind::Irrelevant
        );
    }

    #[test]
    fn subdomain_of_target_is_accepted() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://s.tabelog.com/tokyo/A1311/A131105/13034566/"),
            PageKind::DetailPage
        );
    }

    #[test]
    fn hub_and_listing_pages() {
        let c = classifier();
        assert_eq!(
            c.classify_str("https://tabelog.com/matome/12345/"),
            PageKind::HubSummaryPage
        );
        assert_eq!(
            c.classify_str("https://tabelog.com/tokyo/A1311/A131105/rstLst/ramen/"),
            PageKind::ListingPage
        );
    }

    #[test]
    fn excluded_sections_are_irrelevant() {
        let c = classifier();
        for path in [
            "/tokyo/A1311/A131105/13034566/dtlrvwlst/",
            "/rvwr/somebody/",
            "/tokyo/A1311/A131105/13034566/dtlphotolst/",
            "/tokyo/A1311/A131105/13034566/dtlmenu/",
            "/tokyo/A1311/A131105/13034566/dtlmap/",
            "/help/",
            "/sitemap/",
            "/tokyo/lunch/",
        ] {
            let url = format!("https://tabelog.com{path}");
            assert_eq!(c.classify_str(&url), PageKind::Irrelevant, "{url}");
        }
    }

    #[test]
    fn query_and_fragment_do_not_break_detail_match() {
        let c = classifier();
        for url in [
            "https://tabelog.com/tokyo/A1311/A131105/13034566/?utm_source=x",
            "https://tabelog.com/tokyo/A1311/A131105/13034566/#rstdtl-top",
        ] {
            assert_eq!(c.classify_str(url), PageKind::DetailPage, "{url}");
        }
    }

    #[test]
    fn unparseable_url_is_irrelevant() {
        let c = classifier();
        assert_eq!(c.classify_str("not a url"), PageKind::Irrelevant);
        assert_eq!(c.classify_str(""), PageKind::Irrelevant);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let urls = [
            "https://tabelog.com/tokyo/A1311/A131105/13034566/",
            "https://tabelog.com/matome/1/",
            "https://example.com/",
        ];
        let first: Vec<_> = urls.iter().map(|u| c.classify_str(u)).collect();
        let second: Vec<_> = urls.iter().rev().map(|u| c.classify_str(u)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn invalid_pattern_is_lexicon_error() {
        let mut rules = Lexicon::builtin().expect("builtin").site;
        rules.detail_pattern = "(".into();
        let err = UrlClassifier::new(&rules).unwrap_err();
        assert!(err.to_string().contains("detail_pattern"));
    }
}
