//! Cleanup of pasted chat content before it is encrypted and stored.
//!
//! Chat clients decorate pasted text with code fences, emoji bullets,
//! full-width punctuation and invisible characters. Every step below is
//! idempotent, so `normalize(normalize(t)) == normalize(t)`.

/// Full-width to half-width substitution table.
const FULL_TO_HALF: &[(char, char)] = &[
    ('０', '0'), ('１', '1'), ('２', '2'), ('３', '3'), ('４', '4'),
    ('５', '5'), ('６', '6'), ('７', '7'), ('８', '8'), ('９', '9'),
    ('＋', '+'), ('－', '-'), ('＝', '='), ('／', '/'), ('＼', '\\'),
    ('（', '('), ('）', ')'), ('［', '['), ('］', ']'), ('｛', '{'),
    ('｝', '}'), ('＜', '<'), ('＞', '>'), ('｜', '|'), ('＆', '&'),
    ('＊', '*'), ('＠', '@'), ('＄', '$'), ('％', '%'), ('＾', '^'),
    ('＿', '_'), ('｀', '`'), ('～', '~'), ('：', ':'), ('；', ';'),
    ('＂', '"'), ('＇', '\''), ('，', ','), ('．', '.'), ('？', '?'),
    ('！', '!'), ('　', ' '),
];

/// Returns true for characters stripped from the start of a line
/// (emoji and pictograph blocks chat clients prepend as bullets).
fn is_leading_pictograph(c: char) -> bool {
    matches!(c,
        '\u{1F300}'..='\u{1F9FF}'
        | '\u{2600}'..='\u{26FF}'
        | '\u{2700}'..='\u{27BF}'
        | '\u{1F1E0}'..='\u{1F1FF}')
}

/// Zero-width and soft-hyphen characters removed outright.
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{2060}' | '\u{00AD}')
}

/// Strips a code-fence marker from the start of a line.
///
/// Returns `None` when the line was nothing but a fence (```` ``` ```` plus
/// an optional language word) and should be dropped entirely.
fn strip_fence(line: &str) -> Option<&str> {
    if !line.starts_with("```") {
        return Some(line);
    }
    let rest = line.trim_start_matches('`');
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    if rest.trim().is_empty() { None } else { Some(rest) }
}

/// Strips a leading run of pictographs (and the whitespace after it).
fn strip_pictographs(line: &str) -> &str {
    let trimmed = line.trim_start_matches(is_leading_pictograph);
    if trimmed.len() == line.len() {
        line
    } else {
        trimmed.trim_start()
    }
}

/// Maps a full-width character to its half-width equivalent, if any.
fn to_half_width(c: char) -> char {
    FULL_TO_HALF
        .iter()
        .find(|(full, _)| *full == c)
        .map(|(_, half)| *half)
        .unwrap_or(c)
}

/// Cleans pasted multi-line content.
///
/// In order: unify line endings, strip code-fence markers and leading
/// pictographs per line, map full-width characters to ASCII, drop
/// zero-width characters, collapse runs of blank lines, trim the whole
/// text. Applied before any freeform body is encrypted so the stored
/// record never reflects paste artifacts.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let cleaned: String = unified
        .split('\n')
        .filter_map(strip_fence)
        .map(strip_pictographs)
        .collect::<Vec<_>>()
        .join("\n");

    let mapped: String = cleaned
        .chars()
        .filter(|c| !is_invisible(*c))
        .map(to_half_width)
        .collect();

    // Collapse 3+ consecutive newlines down to a single blank line.
    let mut collapsed = String::with_capacity(mapped.len());
    let mut newlines = 0usize;
    for c in mapped.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                collapsed.push(c);
            }
        } else {
            newlines = 0;
            collapsed.push(c);
        }
    }

    collapsed.trim().to_string()
}
