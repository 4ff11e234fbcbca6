// filter.rs - Structural URL filter
// Purpose: Keep parameterised URLs, drop static assets that can't reflect input

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Static-asset extensions, matched at end of URL or right before `?`
    static ref RE_EXCLUDED_EXTENSION: Regex = Regex::new(
        r"(?i)\.(css|woff|woff2|txt|js|m4r|m4p|m4b|ipa|asa|pkg|crash|asf|asx|wax|wmv|wmx|avi|bmp|class|divx|doc|docx|exe|gif|gz|gzip|ico|jpg|jpeg|jpe|webp|json|mdb|mid|midi|mov|qt|mp3|m4a|mp4|m4v|mpeg|mpg|mpe|webm|mpp|_otf|odb|odc|odf|odg|odp|ods|odt|ogg|pdf|png|pot|pps|ppt|pptx|ra|ram|svg|svgz|swf|tar|tif|tiff|_ttf|wav|wma|wri|xla|xls|xlsx|xlt|xlw|zip)(?:$|\?)"
    )
    .unwrap();
}

pub fn is_excluded_extension(url: &str) -> bool {
    RE_EXCLUDED_EXTENSION.is_match(url)
}

/// Carries a query parameter and is not a static asset
pub fn is_candidate(url: &str) -> bool {
    url.contains('=') && !is_excluded_extension(url)
}

pub fn retain_candidates(urls: &[String]) -> Vec<String> {
    urls.iter().filter(|u| is_candidate(u)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_filter_examples() {
        assert!(is_candidate("https://x.test/a?x=1"));
        assert!(!is_candidate("https://x.test/app.js?x=1"));
        assert!(!is_candidate("https://x.test/a"));
    }

    const EXCLUDED: &[&str] = &[
        "css", "woff", "woff2", "txt", "js", "m4r", "m4p", "m4b", "ipa", "asa", "pkg", "crash",
        "asf", "asx", "wax", "wmv", "wmx", "avi", "bmp", "class", "divx", "doc", "docx", "exe",
        "gif", "gz", "gzip", "ico", "jpg", "jpeg", "jpe", "webp", "json", "mdb", "mid", "midi",
        "mov", "qt", "mp3", "m4a", "mp4", "m4v", "mpeg", "mpg", "mpe", "webm", "mpp", "_otf",
        "odb", "odc", "odf", "odg", "odp", "ods", "odt", "ogg", "pdf", "png", "pot", "pps", "ppt",
        "pptx", "ra", "ram", "svg", "svgz", "swf", "tar", "tif", "tiff", "_ttf", "wav", "wma",
        "wri", "xla", "xls", "xlsx", "xlt", "xlw", "zip",
    ];

    #[test]
    fn test_every_excluded_extension_any_case() {
        for ext in EXCLUDED {
            for ext in [ext.to_string(), ext.to_uppercase()] {
                let bare = format!("https://x.test/file.{}", ext);
                let query = format!("https://x.test/file.{}?q=1", ext);
                assert!(is_excluded_extension(&bare), "{} should be excluded", bare);
                assert!(is_excluded_extension(&query), "{} should be excluded", query);
                assert!(!is_candidate(&query), "{} should not be a candidate", query);
            }
        }
    }

    #[test]
    fn test_mixed_case_extension() {
        assert!(is_excluded_extension("https://x.test/img.PnG?v=2"));
        assert!(is_excluded_extension("https://x.test/font.WoFf2"));
    }

    #[test]
    fn test_unlisted_extensions_pass() {
        for url in [
            "https://x.test/search.php?q=1",
            "https://x.test/page.aspx?id=2",
            "https://x.test/index.html?a=b",
            "https://x.test/?q=1",
            "https://x.test/path",
        ] {
            assert!(!is_excluded_extension(url), "{} should pass", url);
        }
    }

    #[test]
    fn test_extension_must_be_anchored() {
        // `.js` followed by more path is not a static asset
        assert!(!is_excluded_extension("https://x.test/app.js/view?id=1"));
        assert!(!is_excluded_extension("https://x.test/a.jsp?x=1"));
        // query value ending in an extension still matches at end of string
        assert!(is_excluded_extension("https://x.test/r?file=a.png"));
    }

    #[test]
    fn test_retain_candidates_keeps_order() {
        let urls = vec![
            "https://x.test/b?y=2".to_string(),
            "https://x.test/a.png?z=1".to_string(),
            "https://x.test/a?x=1".to_string(),
        ];
        assert_eq!(
            retain_candidates(&urls),
            vec!["https://x.test/b?y=2".to_string(), "https://x.test/a?x=1".to_string()]
        );
    }
}
