//! Noun lemmatization with WordNet style detachment rules.
//!
//! Words are reduced to their singular dictionary form. Irregular plurals come
//! from an exception table; regular ones go through suffix rules guarded
//! against endings that are already singular (`glass`, `virus`, `crisis`).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

static EXCEPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("lice", "louse"),
        ("oxen", "ox"),
        ("dice", "die"),
        ("wolves", "wolf"),
        ("knives", "knife"),
        ("lives", "life"),
        ("wives", "wife"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("loaves", "loaf"),
        ("calves", "calf"),
        ("selves", "self"),
        ("heroes", "hero"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("echoes", "echo"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("theses", "thesis"),
        ("diagnoses", "diagnosis"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("quizzes", "quiz"),
        ("buses", "bus"),
        ("gases", "gas"),
        ("lenses", "lens"),
        ("biases", "bias"),
        ("aliases", "alias"),
        ("atlases", "atlas"),
        ("canvases", "canvas"),
        ("goes", "go"),
        ("cacti", "cactus"),
        ("fungi", "fungus"),
        ("stimuli", "stimulus"),
    ]
    .into_iter()
    .collect()
});

/// Words that look plural but are their own base form.
static INVARIANT: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "news", "series", "species", "means", "lens", "chaos", "atlas", "canvas", "bias",
        "alias", "christmas", "always", "perhaps", "whereas", "sometimes", "afterwards",
        "towards", "thanks", "headquarters", "physics", "mathematics", "economics", "politics",
        "ethics", "athletics", "gymnastics", "sheep", "fish", "deer", "aircraft", "data",
        "texas", "dallas", "kansas", "arkansas", "vegas", "pancreas", "cosmos", "ethos", "pathos",
        "kudos", "carlos", "thanos", "mars", "lucas", "douglas", "thomas", "nicholas",
    ]
    .into_iter()
    .collect()
});

/// Stems ending in `ie` whose plural must not become `-y`.
static IE_STEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "movie", "cookie", "zombie", "tie", "lie", "pie", "die", "rookie", "selfie", "hippie",
        "goalie", "brownie", "calorie", "genie", "newbie", "hoodie", "sweetie", "smoothie",
        "prairie", "auntie", "birdie", "indie", "veggie", "freebie", "groupie", "foodie",
        "junkie", "yuppie", "eerie", "pixie", "bookie", "magpie", "lingerie",
    ]
    .into_iter()
    .collect()
});

/// Stems ending in `che` that take a plain `s` plural.
static CHE_STEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ache", "headache", "niche", "cliche", "quiche", "avalanche", "moustache", "mustache",
        "cache", "psyche", "toothache", "heartache", "backache", "stomachache",
    ]
    .into_iter()
    .collect()
});

/// Words ending in `men` that are not compounds of `man`.
static MEN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "specimen", "omen", "amen", "abdomen", "semen", "stamen", "regimen", "acumen", "hymen",
        "yemen", "ramen",
    ]
    .into_iter()
    .collect()
});

/// Reduce a lowercase token to its base form. Applying it twice gives the
/// same result as applying it once.
pub fn lemmatize(word: &str) -> String {
    let mut current = word.to_owned();
    // Rule output may itself be an irregular plural (`mens` -> `men` -> `man`)
    for _ in 0..4 {
        let next = lemmatize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn lemmatize_once(word: &str) -> String {
    if let Some(base) = EXCEPTIONS.get(word) {
        return (*base).to_owned();
    }
    if word.len() <= 3 || INVARIANT.contains(word) || !word.is_ascii() {
        return word.to_owned();
    }

    if let Some(stem) = word.strip_suffix("men") {
        if !MEN_WORDS.contains(word) {
            return format!("{}man", stem);
        }
        return word.to_owned();
    }

    let Some(without_s) = word.strip_suffix('s') else {
        return word.to_owned();
    };
    if without_s.ends_with('s') || without_s.ends_with('u') || without_s.ends_with('i') {
        // glass, virus, crisis
        return word.to_owned();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if IE_STEMS.contains(without_s) || stem.len() < 2 {
            return without_s.to_owned();
        }
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("ches") {
        if CHE_STEMS.contains(without_s) {
            return without_s.to_owned();
        }
        return format!("{}ch", stem);
    }
    for (suffix, base) in [("sses", "ss"), ("shes", "sh"), ("xes", "x"), ("zzes", "zz")] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{}{}", stem, base);
        }
    }

    without_s.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_plurals() {
        let cases = [
            ("movies", "movie"),
            ("ladies", "lady"),
            ("cities", "city"),
            ("boxes", "box"),
            ("matches", "match"),
            ("headaches", "headache"),
            ("wishes", "wish"),
            ("glasses", "glass"),
            ("houses", "house"),
            ("cars", "car"),
            ("buzzes", "buzz"),
            ("firemen", "fireman"),
        ];
        for (word, lemma) in cases {
            assert_eq!(lemmatize(word), lemma, "lemmatizing {}", word);
        }
    }

    #[test]
    fn irregular_plurals() {
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("mice"), "mouse");
        assert_eq!(lemmatize("wolves"), "wolf");
        assert_eq!(lemmatize("crises"), "crisis");
    }

    #[test]
    fn singular_words_are_untouched() {
        for word in ["glass", "virus", "crisis", "news", "series", "movie", "love", "specimen", "gas"] {
            assert_eq!(lemmatize(word), word);
        }
    }

    #[test]
    fn ses_plurals_and_names_ending_in_s() {
        let cases = [
            ("buses", "bus"),
            ("gases", "gas"),
            ("lenses", "lens"),
            ("goes", "go"),
            ("texas", "texas"),
            ("dallas", "dallas"),
            ("ideas", "idea"),
            ("photos", "photo"),
        ];
        for (word, lemma) in cases {
            assert_eq!(lemmatize(word), lemma, "lemmatizing {}", word);
        }
    }

    #[test]
    fn lemmatizing_is_idempotent() {
        for word in [
            "movies", "mens", "womens", "boxes", "glasses", "children", "ties", "analyses",
            "buses", "stories", "heroes", "parties", "watches",
        ] {
            let once = lemmatize(word);
            assert_eq!(lemmatize(&once), once, "lemmatizing {} twice", word);
        }
    }
}
