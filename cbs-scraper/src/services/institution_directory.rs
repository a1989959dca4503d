//! Institution directory
//!
//! Fixed tables of institution names and aliases. Table order matters:
//! resolution is first-match-wins, so more specific names (e.g. regional
//! Federal Reserve Banks) are listed before names they contain.

/// Institution names as they appear in speech metadata
const INSTITUTIONS: &[&str] = &[
    // Federal Reserve System: regional banks before the Board
    "Federal Reserve Bank of New York",
    "Federal Reserve Bank of Boston",
    "Federal Reserve Bank of Philadelphia",
    "Federal Reserve Bank of Cleveland",
    "Federal Reserve Bank of Richmond",
    "Federal Reserve Bank of Atlanta",
    "Federal Reserve Bank of Chicago",
    "Federal Reserve Bank of St. Louis",
    "Federal Reserve Bank of Minneapolis",
    "Federal Reserve Bank of Kansas City",
    "Federal Reserve Bank of Dallas",
    "Federal Reserve Bank of San Francisco",
    "Board of Governors of the Federal Reserve System",
    // Euro area
    "European Central Bank",
    "Deutsche Bundesbank",
    "Bank of France",
    "Bank of Italy",
    "Bank of Spain",
    "Netherlands Bank",
    "National Bank of Belgium",
    "Central Bank of Ireland",
    "Central Bank of Luxembourg",
    "Central Bank of Malta",
    "Central Bank of Cyprus",
    "Bank of Greece",
    "Bank of Portugal",
    "Bank of Finland",
    "Central Bank of the Republic of Austria",
    "Bank of Slovenia",
    "National Bank of Slovakia",
    "Bank of Estonia",
    "Bank of Latvia",
    "Bank of Lithuania",
    "Croatian National Bank",
    // Rest of Europe
    "Bank of England",
    "Swiss National Bank",
    "Sveriges Riksbank",
    "Norges Bank",
    "Danmarks Nationalbank",
    "Central Bank of Iceland",
    "Czech National Bank",
    "National Bank of Poland",
    "Central Bank of Hungary",
    "National Bank of Romania",
    "Bulgarian National Bank",
    "National Bank of Serbia",
    "National Bank of the Republic of North Macedonia",
    "Central Bank of the Russian Federation",
    "National Bank of Ukraine",
    "Central Bank of the Republic of Turkey",
    // Americas
    "Bank of Canada",
    "Bank of Mexico",
    "Central Bank of Brazil",
    "Central Bank of Argentina",
    "Central Bank of Chile",
    "Central Bank of Colombia",
    "Central Reserve Bank of Peru",
    "Bank of Jamaica",
    "Central Bank of Barbados",
    "Central Bank of Trinidad and Tobago",
    // Asia-Pacific
    "Bank of Japan",
    "People's Bank of China",
    "Hong Kong Monetary Authority",
    "Monetary Authority of Singapore",
    "Bank of Korea",
    "Reserve Bank of India",
    "Bank of Thailand",
    "Bank Indonesia",
    "Central Bank of Malaysia",
    "Bangko Sentral ng Pilipinas",
    "State Bank of Vietnam",
    "Reserve Bank of Australia",
    "Reserve Bank of New Zealand",
    "State Bank of Pakistan",
    "Bangladesh Bank",
    "Central Bank of Sri Lanka",
    "Nepal Rastra Bank",
    "Central Bank of the Republic of China (Taiwan)",
    // Middle East & Africa
    "Bank of Israel",
    "Saudi Central Bank",
    "Central Bank of the United Arab Emirates",
    "Central Bank of Kuwait",
    "Qatar Central Bank",
    "Central Bank of Bahrain",
    "Central Bank of Oman",
    "Central Bank of Jordan",
    "Central Bank of Egypt",
    "Bank Al-Maghrib",
    "South African Reserve Bank",
    "Central Bank of Nigeria",
    "Central Bank of Kenya",
    "Bank of Ghana",
    "Bank of Uganda",
    "Bank of Tanzania",
    "Bank of Mauritius",
    "Bank of Namibia",
    "Bank of Botswana",
    "Reserve Bank of Zimbabwe",
    "Bank of Zambia",
    "Reserve Bank of Malawi",
    "National Bank of Rwanda",
    // International
    "Bank for International Settlements",
];

/// Canonical (lowercase) name → aliases seen in metadata text
const INSTITUTION_ALIASES: &[(&str, &[&str])] = &[
    (
        "board of governors of the federal reserve system",
        &[
            "Board of the US Federal Reserve System",
            "Federal Reserve Board",
            "US Federal Reserve",
            "Federal Reserve System",
        ],
    ),
    ("european central bank", &["ECB"]),
    ("deutsche bundesbank", &["Bundesbank"]),
    ("bank of france", &["Banque de France"]),
    ("bank of italy", &["Banca d'Italia"]),
    ("bank of spain", &["Banco de España", "Banco de Espana"]),
    (
        "netherlands bank",
        &["De Nederlandsche Bank", "Nederlandsche Bank", "Dutch central bank"],
    ),
    ("bank of portugal", &["Banco de Portugal"]),
    ("bank of finland", &["Suomen Pankki"]),
    (
        "central bank of the republic of austria",
        &["Oesterreichische Nationalbank", "Austrian National Bank"],
    ),
    ("bank of slovenia", &["Banka Slovenije"]),
    ("bank of estonia", &["Eesti Pank"]),
    ("bank of latvia", &["Latvijas Banka"]),
    ("bank of lithuania", &["Lietuvos bankas"]),
    ("sveriges riksbank", &["Bank of Sweden", "Riksbank"]),
    ("norges bank", &["Central Bank of Norway"]),
    ("danmarks nationalbank", &["National Bank of Denmark"]),
    ("national bank of poland", &["Narodowy Bank Polski"]),
    ("central bank of hungary", &["Magyar Nemzeti Bank"]),
    ("central bank of the russian federation", &["Bank of Russia"]),
    (
        "central bank of the republic of turkey",
        &["Central Bank of Turkey", "Central Bank of the Republic of Türkiye"],
    ),
    ("bank of mexico", &["Banco de México", "Banco de Mexico"]),
    ("central bank of brazil", &["Banco Central do Brasil"]),
    (
        "central bank of argentina",
        &["Banco Central de la República Argentina"],
    ),
    ("central bank of colombia", &["Banco de la República"]),
    ("people's bank of china", &["PBOC", "People’s Bank of China"]),
    ("hong kong monetary authority", &["HKMA"]),
    ("central bank of malaysia", &["Bank Negara Malaysia"]),
    (
        "bangko sentral ng pilipinas",
        &["Central Bank of the Philippines"],
    ),
    ("reserve bank of new zealand", &["RBNZ"]),
    (
        "saudi central bank",
        &["Saudi Arabian Monetary Agency", "Saudi Arabian Monetary Authority"],
    ),
    ("bank al-maghrib", &["Central Bank of Morocco"]),
    ("central bank of the republic of china (taiwan)", &["Central Bank of China, Taiwan"]),
];

/// Lookup over the institution and alias tables
#[derive(Debug, Clone, Copy)]
pub struct InstitutionDirectory {
    names: &'static [&'static str],
    aliases: &'static [(&'static str, &'static [&'static str])],
}

impl Default for InstitutionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InstitutionDirectory {
    /// Directory over the built-in tables
    pub fn new() -> Self {
        Self {
            names: INSTITUTIONS,
            aliases: INSTITUTION_ALIASES,
        }
    }

    /// Institution names in table order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// `(canonical, aliases)` pairs in table order
    pub fn aliases(&self) -> impl Iterator<Item = (&'static str, &'static [&'static str])> + '_ {
        self.aliases.iter().copied()
    }

    /// Standard form of an institution name
    ///
    /// Aliases map to their canonical name; anything else is returned
    /// trimmed and lowercased.
    pub fn canonicalize(&self, name: &str) -> String {
        match self.resolve_alias(name) {
            Some(canonical) => canonical.to_string(),
            None => name.trim().to_lowercase(),
        }
    }

    /// Canonical name for an exact (case-insensitive) alias
    pub fn resolve_alias(&self, text_fragment: &str) -> Option<&'static str> {
        let needle = text_fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.aliases
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| alias.to_lowercase() == needle))
            .map(|(canonical, _)| *canonical)
    }

    /// Whether `name` canonicalizes to an institution the tables know
    pub fn is_known(&self, name: &str) -> bool {
        let canonical = self.canonicalize(name);
        self.canonical_names().iter().any(|known| *known == canonical)
    }

    /// Every canonical name, sorted and de-duplicated
    pub fn canonical_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .iter()
            .map(|name| self.canonicalize(name))
            .chain(self.aliases.iter().map(|(canonical, _)| canonical.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Folder name for an institution: lowercase, spaces → `_`, `'` and `,`
/// dropped, `&` → `and`
pub fn directory_name(institution: &str) -> String {
    institution
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['\'', '’', ','], "")
        .replace('&', "and")
}
