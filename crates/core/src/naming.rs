//! Scene class naming convention.
//!
//! Derives the class name of the generated scene from the job's human-readable
//! title. The renderer is told to render exactly this class.

/// Class name used when the title yields no usable words.
pub const DEFAULT_SCENE_NAME: &str = "GeneratedScene";

/// Maximum number of title words folded into the class name.
const MAX_NAME_WORDS: usize = 4;

/// Generate a scene class name from a title.
///
/// Convention: strip non-alphanumeric characters, split on whitespace, keep
/// the first four words, title-case each and concatenate. A name that would
/// start with a digit is prefixed with `Scene` so it stays a legal identifier.
///
/// # Examples
///
/// ```
/// use framesmith_core::naming::scene_class_name;
///
/// assert_eq!(scene_class_name("My Cool, Animation!! Demo Extra Words"), "MyCoolAnimationDemo");
/// assert_eq!(scene_class_name("?!"), "GeneratedScene");
/// ```
pub fn scene_class_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let name: String = cleaned
        .split_whitespace()
        .take(MAX_NAME_WORDS)
        .map(title_case)
        .collect();

    if name.is_empty() {
        return DEFAULT_SCENE_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("Scene{name}");
    }
    name
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
