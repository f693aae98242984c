//! Plurals of class names and the registry keys derived from them.

const IRREGULAR: &[(&str, &str)] = &[
    ("criterion", "criteria"),
    ("minimum", "minima"),
    ("maximum", "maxima"),
    ("matrix", "matrices"),
    ("life", "lives"),
    ("focus", "foci"),
];

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Plural of a snake_case identifier, inflecting only the last part.
///
/// - `"Hello"` -> `"Hellos"`
/// - `"Daisy"` -> `"Daisies"`
/// - `"Bounding_box"` -> `"Bounding_boxes"`
/// - `"Some_URL"` -> `"Some_URLs"`
pub fn plural(identifier: &str) -> String {
    let (head, last) = match identifier.rfind('_') {
        Some(pos) => identifier.split_at(pos + 1),
        None => ("", identifier),
    };

    for (singular, irregular) in IRREGULAR {
        if last == *singular {
            return format!("{head}{irregular}");
        }
        if last == capitalize(singular) {
            return format!("{head}{}", capitalize(irregular));
        }
    }

    let vowel_y = ["ay", "ey", "iy", "oy", "uy"];
    if vowel_y.iter().any(|suffix| last.ends_with(suffix)) {
        return format!("{identifier}s");
    }
    if let Some(stem) = last.strip_suffix('y') {
        return format!("{head}{stem}ies");
    }
    if last.ends_with('x') || last.ends_with('s') {
        return format!("{identifier}es");
    }
    format!("{identifier}s")
}

/// Key of a class registry in the JSON tree.
pub fn json_plural(plural: &str) -> String {
    plural.to_lowercase()
}
