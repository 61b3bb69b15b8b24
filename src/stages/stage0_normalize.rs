use std::sync::LazyLock;

use regex::Regex;

/// A named text substitution step
#[derive(Clone, Copy)]
pub struct TextPass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for TextPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextPass").field(&self.name).finish()
    }
}

/// Apply passes in order
pub fn run_passes(passes: &[TextPass], text: &str) -> String {
    passes
        .iter()
        .fold(text.to_string(), |acc, pass| (pass.apply)(&acc))
}

/// Upper bound on repetitions of the paragraph chain
const MAX_ROUNDS: usize = 8;

/// Paragraph cleanup chain. Order matters: later passes assume the
/// earlier ones already ran.
pub const PARAGRAPH_PASSES: &[TextPass] = &[
    TextPass { name: "trim", apply: trim },
    TextPass { name: "whitespace_glyphs", apply: whitespace_glyphs },
    TextPass { name: "collapse_spaces", apply: collapse_spaces },
    TextPass { name: "ellipsis_glyph", apply: ellipsis_glyph },
    TextPass { name: "ellipsis_spacing", apply: ellipsis_spacing },
    TextPass { name: "bracket_spacing", apply: bracket_spacing },
    TextPass { name: "asterisk_rules", apply: asterisk_rules },
    TextPass { name: "comma_runs", apply: comma_runs },
    TextPass { name: "collapse_spaces", apply: collapse_spaces },
    TextPass { name: "leading_residue", apply: leading_residue },
    TextPass { name: "detached_trailing_period", apply: detached_trailing_period },
    TextPass { name: "trim", apply: trim },
];

/// Normalize extracted paragraph text.
///
/// Passes can expose each other's patterns (removing an empty bracket can
/// put an ellipsis next to a word), so the chain is repeated until the text
/// is stable. Running this on its own output is a no-op.
pub fn normalize_text(text: &str) -> String {
    let mut current = run_passes(PARAGRAPH_PASSES, text);
    for _ in 1..MAX_ROUNDS {
        let next = run_passes(PARAGRAPH_PASSES, &current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect(concat!("valid regex ", stringify!($name))));
    };
}

regex!(SPACE_RUN, r" {2,}");
regex!(SPACED_ELLIPSIS, r"\. \. \.");
regex!(PERIOD_RUN, r"\.{3,}");
regex!(ELLIPSIS_DOTS, r"…\.\.");
regex!(ELLIPSIS_AFTER_NON_PERIOD, r"([^.])…");
regex!(PERIOD_ELLIPSIS, r"\.…");
regex!(BRACKETED_ELLIPSIS, r"\(\s*…\s*\)");
regex!(ELLIPSIS_PERIOD_WORD, r"…\.(\w)");
regex!(WORD_ELLIPSIS, r"([\w”])…");
regex!(ELLIPSIS_WORD, r"…(\w)");
regex!(EMPTY_BRACKETS, r"\(\s*\)");
regex!(SPACE_AFTER_OPEN, r"\(\s+");
regex!(SPACE_BEFORE_CLOSE, r"\s+\)");
regex!(ASTERISK_RULE, r"\*{3,}");
regex!(COMMA_RUN, r",(?:\s*,)+");
regex!(SPACE_BEFORE_COMMA, r"\s+,");
regex!(LEADING_PUNCTUATION, r"^[\s.–\-−,)]+");
regex!(LEADING_ARTIFACT, r"^(?:,? *Neil,? +\. +– +|\(PPE-DE\), +\. +– +)");
regex!(DETACHED_TRAILING_PERIOD, r"(?:\s+\.)+\s*$");

pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

/// Tabs and non-breaking spaces become spaces, soft hyphens visible hyphens
pub fn whitespace_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\u{a0}' => ' ',
            '\u{ad}' => '-',
            other => other,
        })
        .collect()
}

pub fn collapse_spaces(text: &str) -> String {
    SPACE_RUN.replace_all(text, " ").into_owned()
}

/// `. . .` and runs of three or more periods become `…`
pub fn ellipsis_glyph(text: &str) -> String {
    let text = SPACED_ELLIPSIS.replace_all(text, "...");
    let text = PERIOD_RUN.replace_all(&text, "…");
    ELLIPSIS_DOTS.replace_all(&text, "…").into_owned()
}

/// The ellipsis is separated from words by a space, except when it is
/// followed by a period
pub fn ellipsis_spacing(text: &str) -> String {
    let text = ELLIPSIS_AFTER_NON_PERIOD.replace_all(text, "${1} …");
    let text = PERIOD_ELLIPSIS.replace_all(&text, " …");
    let text = BRACKETED_ELLIPSIS.replace_all(&text, "(…)");
    let text = ELLIPSIS_PERIOD_WORD.replace_all(&text, "…. ${1}");
    let text = WORD_ELLIPSIS.replace_all(&text, "${1} …");
    ELLIPSIS_WORD.replace_all(&text, "… ${1}").into_owned()
}

/// Drop empty brackets and the padding inside brackets
pub fn bracket_spacing(text: &str) -> String {
    let text = EMPTY_BRACKETS.replace_all(text, "");
    let text = SPACE_AFTER_OPEN.replace_all(&text, "(");
    SPACE_BEFORE_CLOSE.replace_all(&text, ")").into_owned()
}

/// Section rules (`***`) left in running text
pub fn asterisk_rules(text: &str) -> String {
    ASTERISK_RULE.replace_all(text, "").into_owned()
}

pub fn comma_runs(text: &str) -> String {
    let text = COMMA_RUN.replace_all(text, ",");
    SPACE_BEFORE_COMMA.replace_all(&text, ",").into_owned()
}

/// Punctuation, dashes and known boilerplate fragments left at the start of
/// a paragraph once the speaker caption has been removed
pub fn leading_residue(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let stripped = LEADING_PUNCTUATION.replace(&current, "").into_owned();
        let stripped = LEADING_ARTIFACT.replace(&stripped, "").into_owned();
        if stripped == current {
            return current;
        }
        current = stripped;
    }
}

/// `Thank you . ` ends without the detached period
pub fn detached_trailing_period(text: &str) -> String {
    DETACHED_TRAILING_PERIOD.replace(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSY: &[&str] = &[
        "  – Thank you Madam President . ",
        "\u{a0}Mr President,\tI have . . . nothing to add....",
        "This is( … )a test…and more. . .",
        "Well…. Next point ( ) here , , and there",
        ", Neil, . – We agree *** entirely",
        "(PPE-DE), . – Indeed…",
        "– (Applause)",
        "soft\u{ad}hyphen and ( spaced ) brackets",
        "",
        ". – . –",
    ];

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in MESSY {
            let once = normalize_text(raw);
            assert_eq!(normalize_text(&once), once, "input: {:?}", raw);
        }
    }

    #[test]
    fn test_detached_period_and_leading_dash() {
        assert_eq!(
            normalize_text("  – Thank you Madam President . "),
            "Thank you Madam President"
        );
    }

    #[test]
    fn test_whitespace_glyphs() {
        assert_eq!(whitespace_glyphs("a\tb\u{a0}c\u{ad}d"), "a b c-d");
        assert_eq!(collapse_spaces("a    b  c"), "a b c");
    }

    #[test]
    fn test_ellipsis_glyph() {
        assert_eq!(ellipsis_glyph("wait . . . no"), "wait … no");
        assert_eq!(ellipsis_glyph("wait..... no"), "wait… no");
        assert_eq!(ellipsis_glyph("end.."), "end..");
    }

    #[test]
    fn test_ellipsis_spacing() {
        assert_eq!(collapse_spaces(&ellipsis_spacing("word…and")), "word … and");
        assert_eq!(ellipsis_spacing("end.…"), "end …");
        assert_eq!(ellipsis_spacing("cut ( … ) here"), "cut (…) here");
        assert_eq!(collapse_spaces(&ellipsis_spacing("so….Next")), "so …. Next");
    }

    #[test]
    fn test_bracket_spacing() {
        assert_eq!(bracket_spacing("a ( ) b"), "a  b");
        assert_eq!(bracket_spacing("( spaced )"), "(spaced)");
    }

    #[test]
    fn test_comma_runs() {
        assert_eq!(comma_runs("here , , and there"), "here, and there");
        assert_eq!(comma_runs("a,,b"), "a,b");
    }

    #[test]
    fn test_leading_residue_removes_artifacts() {
        assert_eq!(leading_residue(", Neil, . – We agree"), "We agree");
        assert_eq!(leading_residue("– (PPE-DE), . – Indeed"), "Indeed");
        assert_eq!(leading_residue(") . – Mr President"), "Mr President");
        assert_eq!(leading_residue("(Applause)"), "(Applause)");
    }

    #[test]
    fn test_asterisk_rules_removed() {
        assert_eq!(normalize_text("We agree *** entirely"), "We agree entirely");
    }

    #[test]
    fn test_only_punctuation_becomes_empty() {
        assert_eq!(normalize_text(". – . –"), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_remark_survives() {
        assert_eq!(normalize_text("– (Applause)"), "(Applause)");
    }
}
