//! Source-type classification. The tier follows from the kind and never
//! changes with the running reliability score.

use newsdesk_common::{DiscoveredSource, SourceKind};

const WIRE_SERVICES: &[&str] = &["reuters.com", "apnews.com", "afp.com", "bloomberg.com", "upi.com"];

const INVESTIGATIVE_OUTLETS: &[&str] = &[
    "nytimes.com",
    "washingtonpost.com",
    "wsj.com",
    "propublica.org",
    "theguardian.com",
    "npr.org",
    "bbc.com",
    "bbc.co.uk",
    "theintercept.com",
    "latimes.com",
    "politico.com",
    "axios.com",
];

const ACADEMIC_HOSTS: &[&str] = &[
    "doi.org",
    "arxiv.org",
    "jstor.org",
    "ncbi.nlm.nih.gov",
    "nber.org",
    "sciencedirect.com",
    "springer.com",
    "nature.com",
    "wiley.com",
    "ssrn.com",
];

const PRESS_RELEASE_HOSTS: &[&str] = &[
    "prnewswire.com",
    "businesswire.com",
    "globenewswire.com",
    "accesswire.com",
];

const SOCIAL_HOSTS: &[&str] = &[
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
    "reddit.com",
    "threads.net",
    "bsky.app",
    "mastodon.social",
    "youtube.com",
];

const OPINION_HOSTS: &[&str] = &["medium.com", "substack.com"];

const PUBLIC_RECORD_HOSTS: &[&str] = &["courtlistener.com", "opencorporates.com", "muckrock.com"];

fn host_matches(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Infer a source kind from its URL. `None` when the URL has no host.
pub fn classify_url(raw: &str) -> Option<SourceKind> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let path = parsed.path().to_lowercase();

    let kind = if host.ends_with(".gov") || host.ends_with(".mil") || host.contains(".gov.") {
        SourceKind::GovernmentDocument
    } else if host_matches(&host, ACADEMIC_HOSTS) {
        SourceKind::PeerReviewed
    } else if host_matches(&host, WIRE_SERVICES) {
        SourceKind::WireService
    } else if host_matches(&host, PRESS_RELEASE_HOSTS) {
        SourceKind::PressRelease
    } else if host_matches(&host, SOCIAL_HOSTS) {
        SourceKind::UnverifiedSocial
    } else if host_matches(&host, OPINION_HOSTS) || path.contains("/opinion") {
        SourceKind::Opinion
    } else if host_matches(&host, INVESTIGATIVE_OUTLETS) {
        SourceKind::InvestigativeOutlet
    } else if host_matches(&host, PUBLIC_RECORD_HOSTS) {
        SourceKind::PublicRecord
    } else {
        SourceKind::RegionalOutlet
    };
    Some(kind)
}

/// Declared kind wins; otherwise infer from the URL; unusable URLs are anonymous.
pub fn classify_source(source: &DiscoveredSource) -> SourceKind {
    source
        .kind
        .or_else(|| classify_url(&source.url))
        .unwrap_or(SourceKind::Anonymous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_common::SourceTier;

    fn discovered(url: &str, kind: Option<SourceKind>) -> DiscoveredSource {
        DiscoveredSource {
            url: url.to_string(),
            name: None,
            kind,
            claims: Vec::new(),
            excerpt: None,
        }
    }

    #[test]
    fn government_hosts_are_tier_one() {
        let kind = classify_url("https://www.osha.gov/news/release/1").unwrap();
        assert_eq!(kind, SourceKind::GovernmentDocument);
        assert_eq!(kind.tier(), SourceTier::Tier1);
    }

    #[test]
    fn academic_hosts_are_peer_reviewed() {
        assert_eq!(classify_url("https://doi.org/10.1000/xyz"), Some(SourceKind::PeerReviewed));
        assert_eq!(classify_url("https://www.nber.org/papers/w1"), Some(SourceKind::PeerReviewed));
    }

    #[test]
    fn wire_and_investigative_are_tier_two() {
        assert_eq!(classify_url("https://www.reuters.com/a").map(|k| k.tier()), Some(SourceTier::Tier2));
        assert_eq!(classify_url("https://www.propublica.org/a").map(|k| k.tier()), Some(SourceTier::Tier2));
    }

    #[test]
    fn opinion_path_on_major_outlet_is_tier_four() {
        assert_eq!(
            classify_url("https://www.nytimes.com/2024/01/01/opinion/strike.html"),
            Some(SourceKind::Opinion)
        );
    }

    #[test]
    fn subdomains_match_parent() {
        assert_eq!(classify_url("https://old.reddit.com/r/labor"), Some(SourceKind::UnverifiedSocial));
    }

    #[test]
    fn lookalike_hosts_do_not_match() {
        assert_eq!(classify_url("https://notreuters.com/a"), Some(SourceKind::RegionalOutlet));
    }

    #[test]
    fn declared_kind_overrides_url() {
        let s = discovered("https://twitter.com/CityOfChicago/status/1", Some(SourceKind::VerifiedOfficialSocial));
        assert_eq!(classify_source(&s), SourceKind::VerifiedOfficialSocial);
    }

    #[test]
    fn missing_url_is_anonymous() {
        assert_eq!(classify_source(&discovered("", None)), SourceKind::Anonymous);
    }
}
