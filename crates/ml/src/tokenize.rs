use regex::Regex;

/// Default token pattern of the exported vectorizer: two or more word chars.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

pub fn tokenize(pattern: &Regex, input: &str, lowercase: bool) -> Vec<String> {
    let normalized = if lowercase {
        input.to_lowercase()
    } else {
        input.to_string()
    };

    pattern
        .find_iter(&normalized)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Space-joined word n-grams for every `n` in `min_n..=max_n`.
pub fn word_ngrams(tokens: Vec<String>, min_n: usize, max_n: usize) -> Vec<String> {
    if min_n == 1 && max_n == 1 {
        return tokens;
    }

    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n == 1 {
            grams.extend(tokens.iter().cloned());
            continue;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    grams
}
