//! Selector and redirect evaluation over a rendered page

use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use vigil_core::{SelectorProbe, SelectorSpec};

/// Probe every configured selector against the rendered HTML.
///
/// A selector that fails to parse counts as not present; the configuration
/// mistake is logged rather than failing the inspection.
pub fn evaluate_selectors(html: &str, specs: &[SelectorSpec]) -> Vec<SelectorProbe> {
    let document = Html::parse_document(html);

    specs
        .iter()
        .map(|spec| {
            let present = match Selector::parse(&spec.css) {
                Ok(selector) => document.select(&selector).next().is_some(),
                Err(e) => {
                    warn!("Selector {} ({}) is invalid: {:?}", spec.name, spec.css, e);
                    false
                }
            };
            SelectorProbe {
                name: spec.name.clone(),
                present,
            }
        })
        .collect()
}

/// Decide whether navigation counts as a redirect.
///
/// The final URL must differ from the requested one, and must match the
/// pattern when one is configured. Anything else is the normal non-redirect
/// outcome.
pub fn redirect_matches(requested: &str, final_url: &str, pattern: Option<&Regex>) -> bool {
    if final_url == requested {
        return false;
    }
    match pattern {
        Some(re) => re.is_match(final_url),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head><title>Queue</title></head>
        <body>
            <div class="waiting-room">Please wait</div>
            <a class="cta" href="/tickets">Buy now</a>
        </body>
        </html>
    "#;

    fn specs() -> Vec<SelectorSpec> {
        vec![
            SelectorSpec::new("cta", "a.cta"),
            SelectorSpec::new("soldout", ".sold-out"),
        ]
    }

    #[test]
    fn test_selector_presence() {
        let probes = evaluate_selectors(PAGE, &specs());

        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].name, "cta");
        assert!(probes[0].present);
        assert_eq!(probes[1].name, "soldout");
        assert!(!probes[1].present);
    }

    #[test]
    fn test_invalid_selector_is_not_present() {
        let specs = vec![SelectorSpec::new("broken", ":::nope")];
        let probes = evaluate_selectors(PAGE, &specs);
        assert!(!probes[0].present);
    }

    #[test]
    fn test_redirect_requires_url_change() {
        let url = "https://shop.example/queue";
        assert!(!redirect_matches(url, url, None));
    }

    #[test]
    fn test_redirect_without_pattern_accepts_any_change() {
        assert!(redirect_matches(
            "https://shop.example/queue",
            "https://shop.example/store",
            None
        ));
    }

    #[test]
    fn test_redirect_with_pattern() {
        let re = Regex::new(r"/store").unwrap();

        assert!(redirect_matches(
            "https://shop.example/queue",
            "https://shop.example/store",
            Some(&re)
        ));
        assert!(!redirect_matches(
            "https://shop.example/queue",
            "https://shop.example/maintenance",
            Some(&re)
        ));
    }
}
