use std::collections::HashMap;

use crate::errors::RegionNotSupported;

// Values come from the `system.yaml` shipped with the game client
// (player_platform_edge_url, league_edge_url, discoverous_service_location).
// KR, PBE and TW2 are not supported.
const PLAYER_PLATFORM_EDGE_URLS: &[(&str, &str)] = &[
    ("EUW1", "https://euc1-red.pp.sgp.pvp.net"),
    ("EUN1", "https://euc1-red.pp.sgp.pvp.net"),
    ("NA1", "https://usw2-red.pp.sgp.pvp.net"),
    ("LA1", "https://usw2-red.pp.sgp.pvp.net"),
    ("LA2", "https://usw2-red.pp.sgp.pvp.net"),
    ("TR1", "https://euc1-red.pp.sgp.pvp.net"),
    ("RU", "https://euc1-red.pp.sgp.pvp.net"),
    ("OC1", "https://apse1-red.pp.sgp.pvp.net"),
    ("BR1", "https://usw2-red.pp.sgp.pvp.net"),
    ("JP1", "https://apne1-red.pp.sgp.pvp.net"),
    ("SG2", "https://apse1-red.pp.sgp.pvp.net"),
    ("PH2", "https://apse1-red.pp.sgp.pvp.net"),
    ("VN2", "https://apse1-red.pp.sgp.pvp.net"),
    ("TH2", "https://apse1-red.pp.sgp.pvp.net"),
];

const LEAGUE_EDGE_URLS: &[(&str, &str)] = &[
    ("BR1", "https://br-red.lol.sgp.pvp.net"),
    ("EUN1", "https://eune-red.lol.sgp.pvp.net"),
    ("EUW1", "https://euw-red.lol.sgp.pvp.net"),
    ("JP1", "https://jp-red.lol.sgp.pvp.net"),
    ("LA1", "https://lan-red.lol.sgp.pvp.net"),
    ("LA2", "https://las-red.lol.sgp.pvp.net"),
    ("NA1", "https://na-red.lol.sgp.pvp.net"),
    ("OC1", "https://oce-red.lol.sgp.pvp.net"),
    ("RU", "https://ru-red.lol.sgp.pvp.net"),
    ("TR1", "https://tr-red.lol.sgp.pvp.net"),
    ("SG2", "https://sg2-red.lol.sgp.pvp.net"),
    ("PH2", "https://ph2-red.lol.sgp.pvp.net"),
    ("VN2", "https://vn2-red.lol.sgp.pvp.net"),
    ("TH2", "https://th2-red.lol.sgp.pvp.net"),
];

const DISCOVERY_LOCATIONS: &[(&str, &str)] = &[
    ("BR1", "lolriot.mia1.br1"),
    ("EUN1", "lolriot.euc1.eun1"),
    ("EUW1", "lolriot.ams1.euw1"),
    ("JP1", "lolriot.nrt1.jp1"),
    ("LA1", "lolriot.mia1.la1"),
    ("LA2", "lolriot.mia1.la2"),
    ("NA1", "lolriot.pdx2.na1"),
    ("OC1", "lolriot.pdx1.oc1"),
    ("RU", "lolriot.euc1.ru"),
    ("TR1", "lolriot.euc1.tr1"),
    ("SG2", "lolriot.aws-apse1-prod.sg2"),
    ("PH2", "lolriot.aws-apse1-prod.ph2"),
    ("VN2", "lolriot.aws-apse1-prod.vn2"),
    ("TH2", "lolriot.aws-apse1-prod.th2"),
];

/// Routing data for one platform region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRecord {
    /// Platform code, uppercase (e.g. `EUW1`)
    pub code: String,
    pub player_platform_edge_url: String,
    pub league_edge_url: String,
    pub discovery_location: String,
}

impl RegionRecord {
    pub fn new(
        code: impl Into<String>,
        player_platform_edge_url: impl Into<String>,
        league_edge_url: impl Into<String>,
        discovery_location: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into().to_uppercase(),
            player_platform_edge_url: player_platform_edge_url.into(),
            league_edge_url: league_edge_url.into(),
            discovery_location: discovery_location.into(),
        }
    }

    /// Lowercase code, as the session and summoner endpoints expect it
    pub fn code_lower(&self) -> String {
        self.code.to_lowercase()
    }
}

/// Immutable region lookup, built once and shared by reference
///
/// A region is only present when all three tables have an entry for it,
/// so a successful [`RegionDirectory::resolve`] always yields complete
/// routing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDirectory {
    records: HashMap<String, RegionRecord>,
}

impl RegionDirectory {
    /// Directory with the regions the platform edges are known for
    pub fn builtin() -> Self {
        fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
            table.iter().find(|(c, _)| *c == code).map(|(_, v)| *v)
        }

        let records = PLAYER_PLATFORM_EDGE_URLS.iter().filter_map(|(code, ppe)| {
            let ledge = lookup(LEAGUE_EDGE_URLS, *code)?;
            let location = lookup(DISCOVERY_LOCATIONS, *code)?;
            Some(RegionRecord::new(*code, *ppe, ledge, location))
        });

        Self::from_records(records)
    }

    /// Directory from explicit records (custom deployments, tests)
    pub fn from_records(records: impl IntoIterator<Item = RegionRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.code.clone(), record))
                .collect(),
        }
    }

    /// Resolve a platform code, case-insensitively
    pub fn resolve(&self, code: &str) -> Result<&RegionRecord, RegionNotSupported> {
        self.records
            .get(&code.to_uppercase())
            .ok_or_else(|| RegionNotSupported(code.to_string()))
    }

    pub fn player_platform_edge_url(&self, code: &str) -> Result<&str, RegionNotSupported> {
        Ok(&self.resolve(code)?.player_platform_edge_url)
    }

    pub fn league_edge_url(&self, code: &str) -> Result<&str, RegionNotSupported> {
        Ok(&self.resolve(code)?.league_edge_url)
    }

    pub fn discovery_location(&self, code: &str) -> Result<&str, RegionNotSupported> {
        Ok(&self.resolve(code)?.discovery_location)
    }

    /// Supported platform codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.records.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for RegionDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Map a userinfo region tag (`LAN`, `LAS`, `OC`) to its platform code
pub fn platform_code_for_tag(tag: &str) -> String {
    let tag = tag.to_uppercase();
    match tag.as_str() {
        "LAN" => "LA1".to_string(),
        "LAS" => "LA2".to_string(),
        "OC" => "OC1".to_string(),
        _ => tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: &[&str] = &[
        "EUW1", "EUN1", "NA1", "LA1", "LA2", "TR1", "RU", "OC1", "BR1", "JP1", "SG2", "PH2", "VN2",
        "TH2",
    ];

    #[test]
    fn test_supported_regions_resolve_in_every_table() {
        let directory = RegionDirectory::builtin();

        for code in SUPPORTED {
            assert!(!directory.player_platform_edge_url(code).unwrap().is_empty());
            assert!(!directory.league_edge_url(code).unwrap().is_empty());
            assert!(!directory.discovery_location(code).unwrap().is_empty());
        }
        assert_eq!(directory.codes().len(), SUPPORTED.len());
    }

    #[test]
    fn test_unsupported_regions_never_default() {
        let directory = RegionDirectory::builtin();

        for code in ["KR", "PBE", "TW2", "", "EUW"] {
            assert_eq!(
                directory.player_platform_edge_url(code),
                Err(RegionNotSupported(code.to_string()))
            );
            assert_eq!(
                directory.league_edge_url(code),
                Err(RegionNotSupported(code.to_string()))
            );
            assert_eq!(
                directory.discovery_location(code),
                Err(RegionNotSupported(code.to_string()))
            );
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let directory = RegionDirectory::builtin();
        let record = directory.resolve("euw1").unwrap();

        assert_eq!(record.code, "EUW1");
        assert_eq!(record.code_lower(), "euw1");
        assert_eq!(record.discovery_location, "lolriot.ams1.euw1");
    }

    #[test]
    fn test_platform_code_for_tag() {
        assert_eq!(platform_code_for_tag("lan"), "LA1");
        assert_eq!(platform_code_for_tag("LAS"), "LA2");
        assert_eq!(platform_code_for_tag("OC"), "OC1");
        assert_eq!(platform_code_for_tag("euw1"), "EUW1");
    }
}
