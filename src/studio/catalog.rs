use serde::{Deserialize, Serialize};

/// Kokoro language/accent groups. Voice ids encode their group in the
/// prefix: `af_` = American English female, `bm_` = British English male, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "a")]
    AmericanEnglish,
    #[serde(rename = "b")]
    BritishEnglish,
    #[serde(rename = "e")]
    Spanish,
    #[serde(rename = "f")]
    French,
    #[serde(rename = "h")]
    Hindi,
    #[serde(rename = "i")]
    Italian,
    #[serde(rename = "j")]
    Japanese,
    #[serde(rename = "p")]
    BrazilianPortuguese,
    #[serde(rename = "z")]
    MandarinChinese,
}

impl LanguageCode {
    /// Enumeration order. Also the order groups are listed in.
    pub const ALL: [LanguageCode; 9] = [
        LanguageCode::AmericanEnglish,
        LanguageCode::BritishEnglish,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::Hindi,
        LanguageCode::Italian,
        LanguageCode::Japanese,
        LanguageCode::BrazilianPortuguese,
        LanguageCode::MandarinChinese,
    ];

    pub const DEFAULT: LanguageCode = LanguageCode::AmericanEnglish;

    /// Strict lookup of a single-letter code.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Total lookup: unknown codes resolve to [`LanguageCode::DEFAULT`].
    pub fn resolve(code: &str) -> Self {
        Self::parse(code).unwrap_or(Self::DEFAULT)
    }

    pub fn code(self) -> &'static str {
        match self {
            LanguageCode::AmericanEnglish => "a",
            LanguageCode::BritishEnglish => "b",
            LanguageCode::Spanish => "e",
            LanguageCode::French => "f",
            LanguageCode::Hindi => "h",
            LanguageCode::Italian => "i",
            LanguageCode::Japanese => "j",
            LanguageCode::BrazilianPortuguese => "p",
            LanguageCode::MandarinChinese => "z",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LanguageCode::AmericanEnglish => "American English",
            LanguageCode::BritishEnglish => "British English",
            LanguageCode::Spanish => "Spanish",
            LanguageCode::French => "French",
            LanguageCode::Hindi => "Hindi",
            LanguageCode::Italian => "Italian",
            LanguageCode::Japanese => "Japanese",
            LanguageCode::BrazilianPortuguese => "Brazilian Portuguese",
            LanguageCode::MandarinChinese => "Mandarin Chinese",
        }
    }

    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            LanguageCode::AmericanEnglish => &["af_", "am_"],
            LanguageCode::BritishEnglish => &["bf_", "bm_"],
            LanguageCode::Spanish => &["ef_", "em_"],
            LanguageCode::French => &["ff_"],
            LanguageCode::Hindi => &["hf_", "hm_"],
            LanguageCode::Italian => &["if_", "im_"],
            LanguageCode::Japanese => &["jf_", "jm_"],
            LanguageCode::BrazilianPortuguese => &["pf_", "pm_"],
            LanguageCode::MandarinChinese => &["zf_", "zm_"],
        }
    }

    pub fn owns_voice(self, voice: &str) -> bool {
        self.prefixes().iter().any(|p| voice.starts_with(p))
    }

    /// The group a voice id belongs to, derived from its prefix.
    pub fn of_voice(voice: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.owns_voice(voice))
    }
}

/// Kokoro v1.0 voice pack, grouped in [`LanguageCode::ALL`] order.
pub const KOKORO_VOICES: &[&str] = &[
    // American English
    "af_heart", "af_alloy", "af_aoede", "af_bella", "af_jessica", "af_kore", "af_nicole",
    "af_nova", "af_river", "af_sarah", "af_sky", "am_adam", "am_echo", "am_eric", "am_fenrir",
    "am_liam", "am_michael", "am_onyx", "am_puck", "am_santa",
    // British English
    "bf_alice", "bf_emma", "bf_isabella", "bf_lily", "bm_daniel", "bm_fable", "bm_george",
    "bm_lewis",
    // Spanish
    "ef_dora", "em_alex", "em_santa",
    // French
    "ff_siwis",
    // Hindi
    "hf_alpha", "hf_beta", "hm_omega", "hm_psi",
    // Italian
    "if_sara", "im_nicola",
    // Japanese
    "jf_alpha", "jf_gongitsune", "jf_nezumi", "jf_tebukuro", "jm_kumo",
    // Brazilian Portuguese
    "pf_dora", "pm_alex", "pm_santa",
    // Mandarin Chinese
    "zf_xiaobei", "zf_xiaoni", "zf_xiaoxiao", "zf_xiaoyi", "zm_yunjian", "zm_yunxi",
    "zm_yunxia", "zm_yunyang",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceGroup {
    pub language: LanguageCode,
    pub label: String,
    pub voices: Vec<String>,
}

/// Result of re-resolving the voice selector for a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language: LanguageCode,
    pub visible_group: String,
    pub hidden_groups: Vec<String>,
    /// `None` only when the catalog itself is empty.
    pub resolved_voice: Option<String>,
    /// Whether the resolved voice differs from the one passed in.
    pub voice_changed: bool,
}

/// Ordered voice enumeration. Group membership is never stored; it is
/// recomputed from the id prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<String>,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::kokoro()
    }
}

impl VoiceCatalog {
    pub fn new<I, S>(voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            voices: voices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kokoro() -> Self {
        Self::new(KOKORO_VOICES.iter().copied())
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.voices.iter().any(|v| v == voice)
    }

    pub fn voices_for(&self, language: LanguageCode) -> impl Iterator<Item = &str> + '_ {
        self.voices
            .iter()
            .map(String::as_str)
            .filter(move |v| language.owns_voice(v))
    }

    pub fn groups(&self) -> Vec<VoiceGroup> {
        LanguageCode::ALL
            .into_iter()
            .map(|language| VoiceGroup {
                language,
                label: language.label().to_string(),
                voices: self.voices_for(language).map(str::to_string).collect(),
            })
            .collect()
    }

    /// Resolve which group is shown and which voice is active for `code`.
    ///
    /// Total over all inputs: unknown codes behave exactly like the default
    /// language. The current voice survives when it is in the catalog and
    /// carries one of the language's prefixes; otherwise the first voice of
    /// the visible group is taken, then the first voice of the catalog.
    pub fn select_language(&self, code: &str, current_voice: Option<&str>) -> VoiceSelection {
        let language = LanguageCode::resolve(code);

        let hidden_groups = LanguageCode::ALL
            .into_iter()
            .filter(|l| *l != language)
            .map(|l| l.label().to_string())
            .collect();

        let still_valid = current_voice
            .filter(|v| language.owns_voice(v) && self.contains(v))
            .map(str::to_string);

        let resolved_voice = still_valid.or_else(|| {
            self.voices_for(language)
                .next()
                .or_else(|| self.voices.first().map(String::as_str))
                .map(str::to_string)
        });

        let voice_changed = resolved_voice.as_deref() != current_voice;

        VoiceSelection {
            language,
            visible_group: language.label().to_string(),
            hidden_groups,
            resolved_voice,
            voice_changed,
        }
    }
}
