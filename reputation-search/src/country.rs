//! Supported countries and their static search metadata.
//!
//! Every country-dependent lookup (display name, language, provider geo
//! code, disambiguation terms, national press outlets) is a `match` over
//! the closed [`Country`] enum, so adding a country is a compile-checked
//! change rather than a string-keyed table edit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A country that reputation queries can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "US")]
    UnitedStates,
    #[serde(rename = "GB")]
    UnitedKingdom,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "ES")]
    Spain,
    #[serde(rename = "IT")]
    Italy,
    #[serde(rename = "BE")]
    Belgium,
    #[serde(rename = "CH")]
    Switzerland,
    #[serde(rename = "CA")]
    Canada,
    #[serde(rename = "NL")]
    Netherlands,
    #[serde(rename = "PT")]
    Portugal,
    #[serde(rename = "JP")]
    Japan,
}

impl Country {
    /// Returns all supported countries.
    pub fn all() -> &'static [Country] {
        &[
            Self::France,
            Self::UnitedStates,
            Self::UnitedKingdom,
            Self::Germany,
            Self::Spain,
            Self::Italy,
            Self::Belgium,
            Self::Switzerland,
            Self::Canada,
            Self::Netherlands,
            Self::Portugal,
            Self::Japan,
        ]
    }

    /// Parse a case-insensitive ISO 3166-1 alpha-2 code.
    ///
    /// `UK` is accepted as an alias for `GB`. Returns `None` for anything
    /// that is not a supported country.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "FR" => Some(Self::France),
            "US" => Some(Self::UnitedStates),
            "GB" | "UK" => Some(Self::UnitedKingdom),
            "DE" => Some(Self::Germany),
            "ES" => Some(Self::Spain),
            "IT" => Some(Self::Italy),
            "BE" => Some(Self::Belgium),
            "CH" => Some(Self::Switzerland),
            "CA" => Some(Self::Canada),
            "NL" => Some(Self::Netherlands),
            "PT" => Some(Self::Portugal),
            "JP" => Some(Self::Japan),
            _ => None,
        }
    }

    /// ISO 3166-1 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::France => "FR",
            Self::UnitedStates => "US",
            Self::UnitedKingdom => "GB",
            Self::Germany => "DE",
            Self::Spain => "ES",
            Self::Italy => "IT",
            Self::Belgium => "BE",
            Self::Switzerland => "CH",
            Self::Canada => "CA",
            Self::Netherlands => "NL",
            Self::Portugal => "PT",
            Self::Japan => "JP",
        }
    }

    /// English display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::France => "France",
            Self::UnitedStates => "United States",
            Self::UnitedKingdom => "United Kingdom",
            Self::Germany => "Germany",
            Self::Spain => "Spain",
            Self::Italy => "Italy",
            Self::Belgium => "Belgium",
            Self::Switzerland => "Switzerland",
            Self::Canada => "Canada",
            Self::Netherlands => "Netherlands",
            Self::Portugal => "Portugal",
            Self::Japan => "Japan",
        }
    }

    /// Primary language (ISO 639-1) used for scoped queries and analysis.
    pub fn language(&self) -> &'static str {
        match self {
            Self::France | Self::Belgium => "fr",
            Self::UnitedStates | Self::UnitedKingdom | Self::Canada => "en",
            Self::Germany | Self::Switzerland => "de",
            Self::Spain => "es",
            Self::Italy => "it",
            Self::Netherlands => "nl",
            Self::Portugal => "pt",
            Self::Japan => "ja",
        }
    }

    /// Flag emoji for presentation layers.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::France => "🇫🇷",
            Self::UnitedStates => "🇺🇸",
            Self::UnitedKingdom => "🇬🇧",
            Self::Germany => "🇩🇪",
            Self::Spain => "🇪🇸",
            Self::Italy => "🇮🇹",
            Self::Belgium => "🇧🇪",
            Self::Switzerland => "🇨🇭",
            Self::Canada => "🇨🇦",
            Self::Netherlands => "🇳🇱",
            Self::Portugal => "🇵🇹",
            Self::Japan => "🇯🇵",
        }
    }

    /// Provider geolocation code (`gl` parameter).
    pub fn geo_code(&self) -> &'static str {
        match self {
            Self::France => "fr",
            Self::UnitedStates => "us",
            Self::UnitedKingdom => "uk",
            Self::Germany => "de",
            Self::Spain => "es",
            Self::Italy => "it",
            Self::Belgium => "be",
            Self::Switzerland => "ch",
            Self::Canada => "ca",
            Self::Netherlands => "nl",
            Self::Portugal => "pt",
            Self::Japan => "jp",
        }
    }

    /// Local-language terms appended to geography-scoped queries to bias
    /// the provider towards this market.
    pub fn market_terms(&self) -> &'static [&'static str] {
        match self {
            Self::France => &["France"],
            Self::UnitedStates => &["USA"],
            Self::UnitedKingdom => &["UK"],
            Self::Germany => &["Deutschland"],
            Self::Spain => &["España"],
            Self::Italy => &["Italia"],
            Self::Belgium => &["Belgique"],
            Self::Switzerland => &["Schweiz"],
            Self::Canada => &["Canada"],
            Self::Netherlands => &["Nederland"],
            Self::Portugal => &["Portugal"],
            Self::Japan => &["日本"],
        }
    }

    /// National press outlets, most authoritative first.
    pub fn press_domains(&self) -> &'static [&'static str] {
        match self {
            Self::France => &["lemonde.fr", "lefigaro.fr", "lesechos.fr", "liberation.fr"],
            Self::UnitedStates => &["nytimes.com", "washingtonpost.com", "wsj.com", "usatoday.com"],
            Self::UnitedKingdom => &["theguardian.com", "bbc.co.uk", "ft.com", "thetimes.co.uk"],
            Self::Germany => &["spiegel.de", "faz.net", "sueddeutsche.de", "zeit.de"],
            Self::Spain => &["elpais.com", "elmundo.es", "lavanguardia.com", "abc.es"],
            Self::Italy => &["corriere.it", "repubblica.it", "ilsole24ore.com", "lastampa.it"],
            Self::Belgium => &["lesoir.be", "lalibre.be", "standaard.be", "rtbf.be"],
            Self::Switzerland => &["nzz.ch", "letemps.ch", "tagesanzeiger.ch", "rts.ch"],
            Self::Canada => &["theglobeandmail.com", "cbc.ca", "thestar.com", "lapresse.ca"],
            Self::Netherlands => &["nrc.nl", "volkskrant.nl", "nos.nl", "telegraaf.nl"],
            Self::Portugal => &["publico.pt", "expresso.pt", "observador.pt", "dn.pt"],
            Self::Japan => &["nikkei.com", "asahi.com", "japantimes.co.jp", "yomiuri.co.jp"],
        }
    }

    /// Infer the country a domain belongs to.
    ///
    /// Country-code TLDs win; generic TLDs only resolve when the domain is
    /// one of a country's known press outlets.
    pub fn from_domain(domain: &str) -> Option<Self> {
        let lower = domain.trim().to_ascii_lowercase();
        let domain = lower.trim_start_matches("www.");
        if domain.is_empty() {
            return None;
        }

        let tld = domain.rsplit('.').next().unwrap_or_default();
        let by_tld = match tld {
            "fr" => Some(Self::France),
            "uk" => Some(Self::UnitedKingdom),
            "de" => Some(Self::Germany),
            "es" => Some(Self::Spain),
            "it" => Some(Self::Italy),
            "be" => Some(Self::Belgium),
            "ch" => Some(Self::Switzerland),
            "ca" => Some(Self::Canada),
            "nl" => Some(Self::Netherlands),
            "pt" => Some(Self::Portugal),
            "jp" => Some(Self::Japan),
            "us" => Some(Self::UnitedStates),
            _ => None,
        };
        if by_tld.is_some() {
            return by_tld;
        }

        Self::all().iter().copied().find(|country| {
            country
                .press_domains()
                .iter()
                .any(|press| domain == *press || domain.ends_with(&format!(".{press}")))
        })
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
