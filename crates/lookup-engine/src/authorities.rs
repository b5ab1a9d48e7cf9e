//! Curated regulatory authority sources, keyed by jurisdiction.
//!
//! Used when no live search provider is configured or the live call
//! fails: lookup degrades to this table instead of blocking the run.

use shared_types::KnowledgeSource;

pub const US_SOURCES: &[(&str, &str)] = &[
    ("NIST (PII Guidance)", "https://www.nist.gov/"),
    ("FTC", "https://www.ftc.gov/"),
    ("HHS (HIPAA)", "https://www.hhs.gov/hipaa/index.html"),
];

pub const EU_SOURCES: &[(&str, &str)] = &[
    ("EU GDPR", "https://gdpr.eu/"),
    ("EDPB", "https://edpb.europa.eu/"),
];

pub const CA_SOURCES: &[(&str, &str)] = &[(
    "Office of the Privacy Commissioner of Canada",
    "https://www.priv.gc.ca/",
)];

pub const CN_SOURCES: &[(&str, &str)] = &[
    ("National People's Congress (PIPL)", "https://www.npc.gov.cn/"),
    ("Cyberspace Administration of China", "https://www.cac.gov.cn/"),
    ("People's Bank of China", "https://www.pbc.gov.cn/"),
];

/// Jurisdiction-independent fallback.
pub const INTERNATIONAL_SOURCES: &[(&str, &str)] = &[
    ("NIST (PII Guidance)", "https://www.nist.gov/"),
    ("EU GDPR", "https://gdpr.eu/"),
    ("OECD Privacy Guidelines", "https://www.oecd.org/"),
];

/// Domains a live search result may come from, per jurisdiction.
pub fn allowed_domains(jurisdiction: Option<&str>) -> &'static [&'static str] {
    match normalize_jurisdiction(jurisdiction) {
        "US" => &["hhs.gov", "ftc.gov", "nist.gov"],
        "EU" => &["gdpr.eu", "edpb.europa.eu", "europa.eu"],
        "CA" => &["priv.gc.ca"],
        "CN" => &["npc.gov.cn", "cac.gov.cn", "pbc.gov.cn"],
        _ => &[],
    }
}

/// Curated sources for a jurisdiction; unrecognized or absent
/// jurisdictions get the international set.
pub fn curated_sources(jurisdiction: Option<&str>) -> Vec<KnowledgeSource> {
    let table = match normalize_jurisdiction(jurisdiction) {
        "US" => US_SOURCES,
        "EU" => EU_SOURCES,
        "CA" => CA_SOURCES,
        "CN" => CN_SOURCES,
        _ => INTERNATIONAL_SOURCES,
    };
    table
        .iter()
        .map(|(name, url)| KnowledgeSource {
            name: (*name).to_string(),
            url: (*url).to_string(),
            excerpt: None,
        })
        .collect()
}

/// Collapse jurisdiction spellings to a canonical code.
pub fn normalize_jurisdiction(jurisdiction: Option<&str>) -> &'static str {
    let Some(jurisdiction) = jurisdiction else {
        return "";
    };
    match jurisdiction.trim().to_uppercase().as_str() {
        "US" | "USA" | "UNITED STATES" => "US",
        "EU" | "EUROPE" | "EUROPEAN UNION" => "EU",
        "CA" | "CANADA" => "CA",
        "CN" | "CHINA" | "PRC" => "CN",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_jurisdiction_aliases() {
        assert_eq!(normalize_jurisdiction(Some("usa")), "US");
        assert_eq!(normalize_jurisdiction(Some("European Union")), "EU");
        assert_eq!(normalize_jurisdiction(Some("canada")), "CA");
        assert_eq!(normalize_jurisdiction(Some("Atlantis")), "");
        assert_eq!(normalize_jurisdiction(None), "");
    }

    #[test]
    fn test_curated_sources_per_jurisdiction() {
        let us = curated_sources(Some("US"));
        assert_eq!(us.len(), 3, "US table has three authorities");
        assert!(us.iter().any(|s| s.url.contains("nist.gov")));

        let unknown = curated_sources(Some("Atlantis"));
        assert!(unknown.iter().any(|s| s.url.contains("oecd.org")));
    }

    #[test]
    fn test_allowed_domains_scope_search() {
        assert!(allowed_domains(Some("EU")).contains(&"edpb.europa.eu"));
        assert!(allowed_domains(None).is_empty());
    }
}
