//! Shared text processing for the extractive summarizers.
//!
//! Pure, deterministic helpers: sentence splitting, tokenization with
//! per-language stopword removal, TF-IDF term vectors and cosine
//! similarity. Both fallback algorithms build on these, so their
//! behaviour for identical input is identical run to run.

use std::collections::HashMap;

use crate::types::Language;

/// Split text into sentences on terminal punctuation.
///
/// A sentence ends at `.`, `!` or `?` (runs of terminators collapse
/// into the same sentence, so "Wait..." stays whole). Text after the
/// last terminator is kept as a trailing sentence. Whitespace-only
/// fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut in_terminator = false;

    for ch in text.chars() {
        let is_terminator = matches!(ch, '.' | '!' | '?');
        if in_terminator && !is_terminator {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
        current.push(ch);
        in_terminator = is_terminator;
    }
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    sentences
}

/// Lowercase alphanumeric tokens with stopwords removed.
///
/// Single-character tokens are dropped along with stopwords; what
/// remains is the content-word profile of the sentence.
pub fn tokenize(sentence: &str, language: Language) -> Vec<String> {
    let stops = stopwords(language);
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .filter(|w| !stops.contains(&w.as_str()))
        .collect()
}

/// Extend a token list with adjacent-pair bigrams.
pub fn with_bigrams(tokens: &[String]) -> Vec<String> {
    let mut extended = tokens.to_vec();
    extended.extend(
        tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1])),
    );
    extended
}

/// TF-IDF weighted term vectors, one per token list.
///
/// `tf` is the in-sentence relative frequency; `idf` uses the smoothed
/// form `ln((1 + n) / (1 + df)) + 1`, so terms present in every
/// sentence still carry a little weight.
pub fn tfidf_vectors(token_lists: &[Vec<String>]) -> Vec<HashMap<String, f64>> {
    let n = token_lists.len() as f64;

    let mut document_frequency: HashMap<&str, f64> = HashMap::new();
    for tokens in token_lists {
        let mut seen: Vec<&str> = Vec::new();
        for token in tokens {
            if !seen.contains(&token.as_str()) {
                seen.push(token);
                *document_frequency.entry(token).or_insert(0.0) += 1.0;
            }
        }
    }

    token_lists
        .iter()
        .map(|tokens| {
            if tokens.is_empty() {
                return HashMap::new();
            }
            let len = tokens.len() as f64;
            let mut counts: HashMap<&str, f64> = HashMap::new();
            for token in tokens {
                *counts.entry(token).or_insert(0.0) += 1.0;
            }
            counts
                .into_iter()
                .map(|(term, count)| {
                    let df = document_frequency[term];
                    let idf = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
                    (term.to_string(), (count / len) * idf)
                })
                .collect()
        })
        .collect()
}

/// Cosine similarity between two sparse term vectors.
pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    if dot == 0.0 {
        return 0.0;
    }
    let norm_a: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|w| w * w).sum::<f64>().sqrt();
    dot / (norm_a * norm_b)
}

/// Smoothed inverse sentence frequency for pre-computed counts.
pub fn inverse_frequency(total_sentences: usize, containing: usize) -> f64 {
    ((1.0 + total_sentences as f64) / (1.0 + containing as f64)).ln() + 1.0
}

/// Stopword list for a language.
///
/// `Auto` and languages without a dedicated list use the English set;
/// the summarizers' language predicates keep genuinely unsupported
/// languages away from these helpers.
pub fn stopwords(language: Language) -> &'static [&'static str] {
    match language {
        Language::Auto | Language::En => EN_STOPWORDS,
        Language::Es => ES_STOPWORDS,
        Language::Fr => FR_STOPWORDS,
        Language::De => DE_STOPWORDS,
        Language::It => IT_STOPWORDS,
        Language::Pt => PT_STOPWORDS,
        Language::Ru => RU_STOPWORDS,
        _ => EN_STOPWORDS,
    }
}

const EN_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "between", "both", "but", "by", "can", "could",
    "did", "do", "does", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "if", "in",
    "into", "is", "it", "its", "just", "more", "most", "my", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would", "you", "your",
];

const ES_STOPWORDS: &[&str] = &[
    "al", "como", "con", "de", "del", "el", "ella", "en", "entre", "era", "es", "esta",
    "este", "fue", "ha", "la", "las", "lo", "los", "mas", "muy", "no", "para", "pero",
    "por", "que", "se", "sin", "sobre", "son", "su", "sus", "un", "una", "uno", "y", "ya",
];

const FR_STOPWORDS: &[&str] = &[
    "au", "aux", "avec", "ce", "ces", "dans", "de", "des", "du", "elle", "en", "et",
    "est", "il", "ils", "la", "le", "les", "leur", "lui", "mais", "ne", "ou", "par",
    "pas", "pour", "qui", "que", "se", "ses", "son", "sur", "un", "une",
];

const DE_STOPWORDS: &[&str] = &[
    "aber", "als", "auch", "auf", "aus", "bei", "das", "dem", "den", "der", "des", "die",
    "ein", "eine", "einen", "er", "es", "für", "hat", "ich", "im", "in", "ist", "mit",
    "nach", "nicht", "oder", "sich", "sie", "sind", "und", "von", "war", "wie", "zu",
];

const IT_STOPWORDS: &[&str] = &[
    "al", "alla", "che", "come", "con", "da", "dei", "del", "della", "di", "e", "gli",
    "ha", "il", "in", "la", "le", "lo", "ma", "nel", "non", "per", "più", "se", "si",
    "sono", "su", "un", "una", "uno",
];

const PT_STOPWORDS: &[&str] = &[
    "ao", "as", "com", "como", "da", "das", "de", "do", "dos", "e", "em", "ele", "ela",
    "foi", "mais", "mas", "na", "nas", "no", "nos", "não", "os", "ou", "para", "por",
    "que", "se", "sem", "seu", "sua", "um", "uma",
];

const RU_STOPWORDS: &[&str] = &[
    "без", "бы", "был", "была", "были", "в", "вы", "да", "для", "до", "его", "если",
    "же", "за", "из", "или", "их", "как", "ко", "мы", "на", "не", "но", "он", "она",
    "они", "от", "по", "при", "с", "со", "так", "то", "у", "что", "это", "я",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        let sentences = split_sentences("First sentence. Second one! Third? Trailing words");
        assert_eq!(
            sentences,
            vec![
                "First sentence.",
                "Second one!",
                "Third?",
                "Trailing words"
            ]
        );
    }

    #[test]
    fn terminator_runs_stay_in_one_sentence() {
        let sentences = split_sentences("Wait... Really? Yes.");
        assert_eq!(sentences, vec!["Wait...", "Really?", "Yes."]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn tokenize_lowercases_and_drops_stopwords() {
        let tokens = tokenize("The Quick Brown FOX jumps over the lazy dog", Language::En);
        assert_eq!(tokens, vec!["quick", "brown", "fox", "jumps", "lazy", "dog"]);
    }

    #[test]
    fn tokenize_drops_single_characters_and_punctuation() {
        let tokens = tokenize("I a x2, run-time: 99!", Language::En);
        assert_eq!(tokens, vec!["x2", "run", "time", "99"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let tokens: Vec<String> = vec!["quick".into(), "brown".into(), "fox".into()];
        let extended = with_bigrams(&tokens);
        assert_eq!(
            extended,
            vec!["quick", "brown", "fox", "quick brown", "brown fox"]
        );
    }

    #[test]
    fn identical_sentences_have_similarity_one() {
        let lists = vec![
            vec!["cat".to_string(), "sat".to_string()],
            vec!["cat".to_string(), "sat".to_string()],
        ];
        let vectors = tfidf_vectors(&lists);
        let sim = cosine_similarity(&vectors[0], &vectors[1]);
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_sentences_have_similarity_zero() {
        let lists = vec![
            vec!["cat".to_string(), "sat".to_string()],
            vec!["dog".to_string(), "ran".to_string()],
        ];
        let vectors = tfidf_vectors(&lists);
        assert_eq!(cosine_similarity(&vectors[0], &vectors[1]), 0.0);
    }

    #[test]
    fn empty_vector_similarity_is_zero() {
        let empty = HashMap::new();
        let mut other = HashMap::new();
        other.insert("cat".to_string(), 1.0);
        assert_eq!(cosine_similarity(&empty, &other), 0.0);
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let lists = vec![
            vec!["shared".to_string(), "rare".to_string()],
            vec!["shared".to_string()],
            vec!["shared".to_string()],
        ];
        let vectors = tfidf_vectors(&lists);
        let rare = vectors[0]["rare"];
        let shared = vectors[0]["shared"];
        assert!(rare > shared);
    }
}
