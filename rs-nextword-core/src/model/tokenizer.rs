/// Characters stripped from both ends of a word in addition to ASCII punctuation.
const EXTRA_PUNCTUATION: &[char] = &[
	'\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', // curly quotes
	'\u{00AB}', '\u{00BB}', // guillemets
	'\u{2013}', '\u{2014}', '\u{2026}', // dashes, ellipsis
	'\u{00BF}', '\u{00A1}', // inverted marks
];

fn is_punctuation(c: char) -> bool {
	c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(&c)
}

/// Normalizes a single whitespace-delimited piece of text.
///
/// Strips leading and trailing punctuation and lowercases the rest.
/// Returns `None` when nothing is left (ex. `"--"`).
pub fn normalize(word: &str) -> Option<String> {
	let trimmed = word.trim_matches(is_punctuation);
	if trimmed.is_empty() {
		return None;
	}
	Some(trimmed.to_lowercase())
}

/// Splits raw text into an ordered sequence of normalized tokens.
///
/// - Splits on Unicode whitespace
/// - Strips leading/trailing punctuation, keeps inner punctuation (`don't`)
/// - Lowercases every token
///
/// Empty input yields an empty sequence.
pub fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace().filter_map(normalize).collect()
}

/// Returns the token a prediction should be keyed on: the last word of `text`.
pub fn last_token(text: &str) -> Option<String> {
	text.split_whitespace().rev().find_map(normalize)
}
