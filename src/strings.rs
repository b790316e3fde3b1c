// Only the escapes \n, \" and \\ exist in a string literal. One table
// drives both directions: the reader decodes through the left column, the
// printer re-encodes through the right.

use bimap::BiMap;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m
    };
}

pub(crate) fn decode_escape(c: char) -> Option<char> {
    ESCAPES.get_by_left(&c).copied()
}

/// The readable rendering of a string: surrounding quotes, contents
/// re-escaped so that reading the result back yields the same string.
pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::with_capacity(src.len() + 2);
    output.push('"');
    for c in src.chars() {
        match ESCAPES.get_by_right(&c) {
            Some(&escape) => {
                output.push('\\');
                output.push(escape);
            }
            None => output.push(c),
        }
    }
    output.push('"');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_quoted() {
        assert_eq!(string_repr("asdf"), "\"asdf\"");
    }

    #[test]
    fn specials_are_escaped() {
        assert_eq!(string_repr("a\nb"), "\"a\\nb\"");
        assert_eq!(string_repr("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(string_repr("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn decode_covers_exactly_the_three_escapes() {
        assert_eq!(decode_escape('n'), Some('\n'));
        assert_eq!(decode_escape('"'), Some('"'));
        assert_eq!(decode_escape('\\'), Some('\\'));
        assert_eq!(decode_escape('t'), None);
    }
}
