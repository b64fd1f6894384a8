//! Candidate-name normalization for anchor and title text.
//!
//! Raw titles carry site branding, reviewer names, bracketed annotations
//! and marketing phrases. [`NameNormalizer::normalize`] runs a fixed,
//! ordered pipeline over the text and either returns a clean name or
//! rejects it. Later stages assume the earlier ones already ran, so the
//! order below must not change:
//!
//! 1. truncate at the first branding separator
//! 2. strip trailing honorifics
//! 3. remove bracketed annotations
//! 4. remove listed reviewer handles
//! 5. remove handle-shaped tokens
//! 6. remove marketing phrases
//! 7. clean punctuation and whitespace, then strip any trailing honorific
//!    that an annotation or decoration was hiding
//! 8. validity gate

use regex::Regex;

use crate::error::{ExtractError, Result};
use crate::lexicon::NameRules;

/// Characters at least one of which must survive for a name to be valid.
const VALID_CHAR_PATTERN: &str = r"[a-zA-Z0-9\p{Han}\p{Hiragana}\p{Katakana}]";

/// Shortest accepted name, in characters.
const MIN_NAME_CHARS: usize = 2;

/// Deterministic name-cleaning pipeline compiled from a lexicon.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    separators: Vec<String>,
    honorific_suffix: Option<Regex>,
    brackets: Vec<Regex>,
    reviewer_handles: Vec<String>,
    handle_token: Regex,
    marketing: Vec<Regex>,
    decorations: Vec<String>,
    whitespace_run: Regex,
    valid_char: Regex,
}

impl NameNormalizer {
    /// Compile the normalizer from the name rules of a lexicon.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] if a pattern fails to compile.
    pub fn new(rules: &NameRules) -> Result<Self> {
        let honorific_suffix = if rules.honorifics.is_empty() {
            None
        } else {
            let alternation = rules
                .honorifics
                .iter()
                .map(|h| regex::escape(h))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(
                &format!(r"(?:\s*(?:{alternation}))+\s*$"),
                "honorifics",
            )?)
        };

        let brackets = rules
            .brackets
            .iter()
            .map(|[open, close]| {
                compile(
                    &format!(r"\s*{}.*?{}", regex::escape(open), regex::escape(close)),
                    "brackets",
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let marketing = rules
            .marketing_patterns
            .iter()
            .map(|p| compile(p, "marketing_patterns"))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            separators: rules.separators.clone(),
            honorific_suffix,
            brackets,
            reviewer_handles: rules.reviewer_handles.clone(),
            handle_token: compile(&rules.handle_pattern, "handle_pattern")?,
            marketing,
            decorations: rules.decorations.clone(),
            whitespace_run: compile(r"\s+", "whitespace")?,
            valid_char: compile(VALID_CHAR_PATTERN, "valid characters")?,
        })
    }

    /// Clean `raw` into a candidate name.
    ///
    /// Returns `None` when the text does not look like a name. Never
    /// returns an empty string.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let mut text = raw.to_owned();

        for separator in &self.separators {
            if let Some(index) = text.find(separator.as_str()) {
                text.truncate(index);
            }
        }

        text = self.strip_honorifics(&text);

        for bracket in &self.brackets {
            text = bracket.replace_all(&text, "").into_owned();
        }

        for handle in &self.reviewer_handles {
            if text.contains(handle.as_str()) {
                text = text.replace(handle.as_str(), "");
            }
        }

        text = self.handle_token.replace_all(&text, "").into_owned();

        for pattern in &self.marketing {
            text = pattern.replace_all(&text, "").into_owned();
        }

        text = text.replace('\u{3000}', " ");
        for decoration in &self.decorations {
            text = text.replace(decoration.as_str(), "");
        }
        let text = self.whitespace_run.replace_all(&text, " ");
        let text = self.strip_honorifics(text.trim());
        let text = text.trim();

        if text.chars().count() < MIN_NAME_CHARS || !self.valid_char.is_match(text) {
            tracing::debug!(raw, cleaned = text, "name rejected");
            return None;
        }

        tracing::trace!(raw, cleaned = text, "name normalized");
        Some(text.to_owned())
    }

    fn strip_honorifics(&self, text: &str) -> String {
        match &self.honorific_suffix {
            Some(suffix) => suffix.replace(text, "").into_owned(),
            None => text.to_owned(),
        }
    }
}

fn compile(pattern: &str, table: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ExtractError::Lexicon(format!("invalid {table} pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn normalizer() -> NameNormalizer {
        let lexicon = Lexicon::builtin().expect("builtin lexicon");
        NameNormalizer::new(&lexicon.names).expect("normalizer")
    }

    fn norm(raw: &str) -> Option<String> {
        normalizer().normalize(raw)
    }

    #[test]
    fn site_brand_after_pipe_is_dropped() {
        assert_eq!(norm("麦's Ramen | 食べログ").as_deref(), Some("麦's Ramen"));
    }

    #[test]
    fn earliest_separator_wins() {
        assert_eq!(
            norm("鮨 さいとう / 六本木 - 寿司 | 食べログ").as_deref(),
            Some("鮨 さいとう")
        );
        assert_eq!(norm("蕎麦 こうが - 新宿").as_deref(), Some("蕎麦 こうが"));
    }

    #[test]
    fn trailing_honorifics_stripped() {
        assert_eq!(norm("山田太郎さん").as_deref(), Some("山田太郎"));
        assert_eq!(norm("鈴木 様").as_deref(), Some("鈴木"));
        assert_eq!(norm("佐藤さん様").as_deref(), Some("佐藤"));
    }

    #[test]
    fn honorific_hidden_by_annotation_is_stripped() {
        assert_eq!(norm("田中さん（名無し）").as_deref(), Some("田中"));
        assert_eq!(norm("佐藤さん (新宿)").as_deref(), Some("佐藤"));
        assert_eq!(norm("鮨 さいとうさん【予約困難】").as_deref(), Some("鮨 さいとう"));
        assert_eq!(norm("『山田さん』").as_deref(), Some("山田"));
    }

    #[test]
    fn honorific_inside_name_is_kept() {
        assert_eq!(norm("さん天 本店").as_deref(), Some("さん天 本店"));
    }

    #[test]
    fn bracketed_annotations_removed() {
        assert_eq!(
            norm("焼鳥 鳥しき (目黒) [予約困難] 【名店】《特集》").as_deref(),
            Some("焼鳥 鳥しき")
        );
        assert_eq!(norm("鰻 尾花（名無し）").as_deref(), Some("鰻 尾花"));
    }

    #[test]
    fn listed_reviewer_handles_removed() {
        assert_eq!(norm("ノブヒロ＠上野 鰻 尾花").as_deref(), Some("鰻 尾花"));
        assert_eq!(norm("天ぷら 近藤 Shoebill").as_deref(), Some("天ぷら 近藤"));
    }

    #[test]
    fn reviewer_handles_are_case_sensitive() {
        assert_eq!(norm("SHOEBILL 鮨").as_deref(), Some("SHOEBILL 鮨"));
    }

    #[test]
    fn lowercase_handle_tokens_removed() {
        assert_eq!(norm("foodie_99 天ぷら 近藤").as_deref(), Some("天ぷら 近藤"));
    }

    #[test]
    fn handle_tokens_glued_to_japanese_are_removed() {
        assert_eq!(norm("鮨abc 本店").as_deref(), Some("鮨 本店"));
        assert_eq!(norm("天ぷら近藤foodie").as_deref(), Some("天ぷら近藤"));
        assert_eq!(norm("Ramen二郎").as_deref(), Some("Ramen二郎"));
    }

    #[test]
    fn marketing_phrases_removed() {
        assert_eq!(
            norm("【最新版】蕎麦 こうが おすすめランチ").as_deref(),
            Some("蕎麦 こうが")
        );
        assert_eq!(norm("～新感覚～ 鮨 さいとう").as_deref(), Some("鮨 さいとう"));
        assert_eq!(norm("西日暮里 人気店10選").as_deref(), Some("西日暮里"));
    }

    #[test]
    fn decorations_and_whitespace_cleaned() {
        assert_eq!(norm("鮨　さいとう").as_deref(), Some("鮨 さいとう"));
        assert_eq!(norm("  「中華そば」   二郎  ").as_deref(), Some("中華そば 二郎"));
        assert_eq!(norm("『ラーメン』 二郎").as_deref(), Some("ラメン 二郎"));
    }

    #[test]
    fn rejection_boundary() {
        assert_eq!(norm(""), None);
        assert_eq!(norm("麦"), None);
        assert_eq!(norm("🍜🍜"), None);
        assert_eq!(norm("!?!?"), None);
        assert_eq!(norm("食べログ"), None);
        assert_eq!(norm("ab").as_deref(), Some("ab"));
        assert_eq!(norm("鮨屋").as_deref(), Some("鮨屋"));
        assert_eq!(norm("12").as_deref(), Some("12"));
    }

    #[test]
    fn normalization_is_idempotent_on_clean_output() {
        let n = normalizer();
        for raw in [
            "麦's Ramen | 食べログ",
            "焼鳥 鳥しき (目黒) [予約困難]",
            "ノブヒロ＠上野 鰻 尾花",
            "『ラーメン』 二郎",
            "【最新版】蕎麦 こうが おすすめランチ",
            "SHOEBILL 鮨",
            "ab",
            "田中さん（名無し）",
            "佐藤さん (新宿)",
            "鮨 さいとうさん【予約困難】",
            "『山田さん』",
            "鮨abc 本店",
        ] {
            let once = n.normalize(raw).expect(raw);
            assert_eq!(n.normalize(&once).as_deref(), Some(once.as_str()), "{raw}");
        }
    }

    #[test]
    fn never_returns_empty_string() {
        let n = normalizer();
        for raw in ["", " ", "|", "()", "【】", "ー", "taniy", "　"] {
            assert_ne!(n.normalize(raw).as_deref(), Some(""), "{raw:?}");
        }
    }

    #[test]
    fn invalid_marketing_pattern_is_lexicon_error() {
        let mut rules = Lexicon::builtin().expect("builtin").names;
        rules.marketing_patterns.push("[".into());
        let err = NameNormalizer::new(&rules).unwrap_err();
        assert!(err.to_string().contains("marketing_patterns"));
    }
}
