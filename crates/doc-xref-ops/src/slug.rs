/// Convert heading text into an anchor slug.
///
/// Lower-cases the text, drops everything that is not alphanumeric, `-`, or
/// whitespace, and turns each run of whitespace into a single `-`. Existing
/// hyphens are kept as written.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_alphanumeric() || *ch == '-' || ch.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("-")
}
