//! Strips lightweight markdown from model output before it is shown to the user.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Valid regex pattern"));

// The opening `*` must not be followed by whitespace, otherwise it is a bullet.
// `??` tries the empty group first so `**` collapses the same way as a lookahead would.
static EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*(\S.*?)??\*").expect("Valid regex pattern"));

static UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.*?)_").expect("Valid regex pattern"));

static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").expect("Valid regex pattern"));

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\*\s+").expect("Valid regex pattern"));

/// Removes bold, emphasis, underscore and inline-code markers and rewrites `*` bullets as
/// `- ` items on their own line. The result is trimmed.
pub fn clean_markdown(text: &str) -> String {
    let text = BOLD.replace_all(text, "${1}");
    let text = EMPHASIS.replace_all(&text, "${1}");
    let text = UNDERSCORE.replace_all(&text, "${1}");
    let text = CODE.replace_all(&text, "${1}");
    let text = BULLET.replace_all(&text, "\n- ");

    text.trim().to_owned()
}
