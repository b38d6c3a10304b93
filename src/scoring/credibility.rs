//! Source credibility lookup.
//!
//! Known outlets are graded in three tiers; everything else gets
//! [`UNKNOWN_SCORE`]. A domain that is a subdomain of a known outlet, or
//! shares its name under another suffix (`reuters.co.uk` for
//! `reuters.com`), gets the outlet's score minus [`PARTIAL_MATCH_PENALTY`].

use reputation_search::domain::is_same_or_subdomain;

/// Lowest possible credibility.
pub const MIN_CREDIBILITY: u8 = 30;
/// Highest possible credibility.
pub const MAX_CREDIBILITY: u8 = 100;
/// Score for domains not in the table.
pub const UNKNOWN_SCORE: u8 = 65;
/// Deduction for subdomain and near-name matches.
pub const PARTIAL_MATCH_PENALTY: u8 = 5;

/// Outlet grades, most specific entries first.
///
/// Tier 1 (90-95): wire services and national papers of record.
/// Tier 2 (80-90): major national and business press, public broadcasters.
/// Tier 3 (65-85): regional, trade and general-interest outlets.
/// User-generated hosting sits below unknown.
const OUTLETS: &[(&str, u8)] = &[
    // tier 1
    ("reuters.com", 95),
    ("apnews.com", 95),
    ("afp.com", 95),
    ("nytimes.com", 95),
    ("lemonde.fr", 95),
    ("ft.com", 95),
    ("wsj.com", 95),
    ("economist.com", 95),
    ("bbc.co.uk", 93),
    ("bbc.com", 93),
    ("theguardian.com", 92),
    ("washingtonpost.com", 92),
    ("bloomberg.com", 92),
    ("nikkei.com", 92),
    ("nzz.ch", 92),
    ("lefigaro.fr", 90),
    ("lesechos.fr", 90),
    ("spiegel.de", 90),
    ("faz.net", 90),
    ("elpais.com", 90),
    ("corriere.it", 90),
    // tier 2
    ("sueddeutsche.de", 88),
    ("zeit.de", 88),
    ("theglobeandmail.com", 88),
    ("asahi.com", 88),
    ("cbc.ca", 87),
    ("liberation.fr", 85),
    ("elmundo.es", 85),
    ("repubblica.it", 85),
    ("ilsole24ore.com", 85),
    ("lesoir.be", 85),
    ("letemps.ch", 85),
    ("nrc.nl", 85),
    ("volkskrant.nl", 85),
    ("publico.pt", 85),
    ("japantimes.co.jp", 85),
    ("yomiuri.co.jp", 85),
    ("france24.com", 85),
    ("politico.eu", 85),
    ("usatoday.com", 82),
    ("thetimes.co.uk", 82),
    ("lavanguardia.com", 82),
    ("lastampa.it", 82),
    ("lalibre.be", 82),
    ("standaard.be", 82),
    ("rtbf.be", 82),
    ("tagesanzeiger.ch", 82),
    ("rts.ch", 82),
    ("thestar.com", 82),
    ("lapresse.ca", 82),
    ("nos.nl", 82),
    ("expresso.pt", 82),
    ("observador.pt", 80),
    ("cnn.com", 80),
    ("forbes.com", 80),
    // tier 3
    ("latribune.fr", 78),
    ("businessinsider.com", 76),
    ("techcrunch.com", 76),
    ("lepoint.fr", 75),
    ("lexpress.fr", 75),
    ("abc.es", 75),
    ("telegraaf.nl", 72),
    ("dn.pt", 72),
    ("wired.com", 72),
    ("theverge.com", 70),
    ("huffpost.com", 70),
    ("20minutes.fr", 68),
    ("yahoo.com", 66),
    // user-generated
    ("medium.com", 50),
    ("substack.com", 50),
    ("blogspot.com", 40),
    ("wordpress.com", 40),
];

/// Domain to credibility mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredibilityScorer;

impl CredibilityScorer {
    /// Credibility of `domain`, always within
    /// [`MIN_CREDIBILITY`]..=[`MAX_CREDIBILITY`].
    pub fn score(&self, domain: &str) -> u8 {
        let lower = domain.trim().to_ascii_lowercase();
        let domain = lower.trim_start_matches("www.");
        let raw = if domain.is_empty() {
            UNKNOWN_SCORE
        } else if let Some(score) = exact(domain) {
            score
        } else if let Some(score) = partial(domain) {
            score.saturating_sub(PARTIAL_MATCH_PENALTY)
        } else {
            UNKNOWN_SCORE
        };
        raw.clamp(MIN_CREDIBILITY, MAX_CREDIBILITY)
    }
}

fn exact(domain: &str) -> Option<u8> {
    OUTLETS
        .iter()
        .find(|(known, _)| *known == domain)
        .map(|(_, score)| *score)
}

fn partial(domain: &str) -> Option<u8> {
    OUTLETS
        .iter()
        .find(|(known, _)| is_same_or_subdomain(domain, known) || same_name(domain, known))
        .map(|(_, score)| *score)
}

/// `reuters.co.uk` vs `reuters.com`: same leading label, different suffix.
/// Short names are too ambiguous to match on (`ft`, `nos`, `abc`).
fn same_name(domain: &str, known: &str) -> bool {
    let name = |d: &str| d.split('.').next().unwrap_or_default().to_owned();
    let known_name = name(known);
    known_name.chars().count() >= 5 && name(domain) == known_name
}
