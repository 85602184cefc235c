use phf::{phf_map, phf_set};
use std::borrow::Cow;
use unicode_normalization::char::decompose_canonical;

/// Replacements for characters that survive lowercasing but do not belong
/// in a normalized name. Separators become spaces so the words they joined
/// stay distinct; quote-like marks vanish.
static FOLD: phf::Map<char, &'static str> = phf_map! {
    'æ' => "a",
    'ø' => "o",
    'ß' => "ss",
    'ð' => "o",
    'þ' => "b",
    '`' => "",
    '´' => "",
    '„' => "",
    '“' => "",
    '”' => "",
    '’' => "",
    '\'' => "",
    '"' => "",
    '~' => "",
    '(' => "",
    ')' => "",
    '{' => "",
    '}' => "",
    '[' => "",
    ']' => "",
    '–' => " ",
    '-' => " ",
    '.' => " ",
    ':' => " ",
    '/' => " ",
    '\\' => " ",
    '|' => " ",
    '*' => " ",
    '&' => " and ",
};

/// Noble particles removed from multi-word surnames.
static PARTICLES: phf::Set<&'static str> = phf_set! {
    "van",
    "von",
    "de",
    "d",
    "di",
    "dei",
    "of",
    "zu",
    "zur",
    "dos",
    "af",
    "der",
    "graf",
};

/// Normalize a name for comparison: lowercase, fold diacritics and
/// typographic punctuation to ASCII or space, drop digits, and collapse
/// whitespace runs.
///
/// Accented Latin letters fold to their base letters; letters with no
/// ASCII decomposition (Han, Cyrillic, ...) survive unchanged.
///
/// # Examples
/// ```
/// use persons::normalize;
///
/// assert_eq!(normalize("Jean-Luc"), "jean luc");
/// assert_eq!(normalize("Müller"), "muller");
/// assert_eq!(normalize("  Tim   W. "), "tim w");
/// ```
pub fn normalize(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());

    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_numeric() {
            continue;
        }
        if let Some(replacement) = FOLD.get(&c) {
            folded.push_str(replacement);
        } else if c.is_ascii() || !c.is_alphabetic() {
            folded.push(c);
        } else {
            let mut decomposed = false;
            decompose_canonical(c, |d| {
                if d.is_ascii_alphabetic() {
                    folded.push(d);
                    decomposed = true;
                }
            });
            if !decomposed {
                folded.push(c);
            }
        }
    }

    collapse_whitespace(&folded)
}

/// Remove noble particles from a multi-word surname, unless nothing would
/// remain. Single words are returned untouched.
///
/// # Examples
/// ```
/// use persons::remove_particles;
///
/// assert_eq!(remove_particles("von der leyen"), "leyen");
/// assert_eq!(remove_particles("van"), "van");
/// ```
pub fn remove_particles(s: &str) -> Cow<str> {
    if s.split(' ').nth(1).is_none() {
        return Cow::Borrowed(s);
    }

    let kept: Vec<&str> = s
        .split_whitespace()
        .filter(|word| !PARTICLES.contains(word))
        .collect();

    if kept.is_empty() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(kept.join(" "))
    }
}

/// Reduce whitespace runs to single spaces and trim the ends.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
