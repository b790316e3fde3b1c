use crate::strings;
use crate::symbols::SymbolTable;
use crate::types::{ScmInt, ScmObject};
use std::fmt;

pub type Result<T = ScmObject> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedCharacter(char),
    UnexpectedEof,
    MissingDelimiter(&'static str),
    BadNumber,
    UnterminatedString,
    UnknownEscape(char),
    BadHashLiteral(char),
    UnknownCharacterName(String),
    DotNotDelimited,
    MissingClosingParen,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            Error::UnexpectedEof => write!(f, "unexpected end of input"),
            Error::MissingDelimiter(what) => write!(f, "{} not followed by delimiter", what),
            Error::BadNumber => write!(f, "could not read number"),
            Error::UnterminatedString => write!(f, "unterminated string literal"),
            Error::UnknownEscape(c) => write!(f, "unknown escape '\\{}' in string literal", c),
            Error::BadHashLiteral(c) => {
                write!(f, "unknown boolean or character literal '#{}'", c)
            }
            Error::UnknownCharacterName(name) => {
                write!(f, "unknown character name '{}'", name)
            }
            Error::DotNotDelimited => write!(f, "dot not followed by delimiter"),
            Error::MissingClosingParen => write!(f, "where was the trailing right paren?"),
        }
    }
}

/// A positioned cursor over source text. `tell`/`seek` give the reader the
/// pushback it needs, e.g. to tell the dot of a dotted pair apart from the
/// first character of a list element.
pub struct Source {
    chars: Vec<char>,
    pos: usize,
}

impl Source {
    pub fn new(text: &str) -> Self {
        Source {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn tell(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }
}

/// A delimiter legally terminates a token. End of input counts.
fn is_delimiter(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => c.is_whitespace() || c == '(' || c == ')' || c == '"' || c == ';',
    }
}

/// Characters allowed to start a symbol, besides letters.
fn is_initial(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '*' | '/' | '<' | '>' | '=' | '?' | '!')
}

/// Skip whitespace and `;` line comments. Returns the first significant
/// character (already consumed) and the position it was read from, so the
/// caller can seek back to un-read it.
fn eat_whitespace(source: &mut Source) -> (Option<char>, usize) {
    loop {
        let pos = source.tell();
        match source.next() {
            Some(c) if c.is_whitespace() => continue,
            Some(';') => {
                while let Some(c) = source.next() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            c => return (c, pos),
        }
    }
}

pub fn read_str(input: &str, symbols: &mut SymbolTable) -> Result {
    log::trace!("read {:?}", input);
    read(&mut Source::new(input), symbols)
}

/// Read exactly one datum, leaving the cursor just past it.
pub fn read(source: &mut Source, symbols: &mut SymbolTable) -> Result {
    let (c, _) = eat_whitespace(source);
    match c {
        None => Err(Error::UnexpectedEof),
        Some('#') => read_hash(source),
        Some(c) if c.is_ascii_digit() => read_fixnum(source, c, false),
        Some(sign) if (sign == '-' || sign == '+') && digit_follows(source) => {
            let leading = source.next().unwrap();
            read_fixnum(source, leading, sign == '-')
        }
        Some(c) if is_initial(c) || ((c == '-' || c == '+') && is_delimiter(source.peek())) => {
            read_symbol(source, c, symbols)
        }
        Some('"') => read_string(source),
        Some('(') => read_pair(source, symbols),
        Some('\'') => {
            let quoted = read(source, symbols)?;
            let quote = ScmObject::Symbol(symbols.intern("quote"));
            Ok(ScmObject::list_from_vec(vec![quote, quoted]))
        }
        Some(c) => Err(Error::UnexpectedCharacter(c)),
    }
}

fn digit_follows(source: &Source) -> bool {
    source.peek().map_or(false, |c| c.is_ascii_digit())
}

fn read_fixnum(source: &mut Source, leading: char, negative: bool) -> Result {
    let mut digits = String::new();
    digits.push(leading);
    while digit_follows(source) {
        digits.push(source.next().unwrap());
    }
    if !is_delimiter(source.peek()) {
        return Err(Error::MissingDelimiter("number"));
    }
    let value: ScmInt = digits.parse().or(Err(Error::BadNumber))?;
    Ok(ScmObject::Fixnum(if negative { -value } else { value }))
}

fn read_symbol(source: &mut Source, leading: char, symbols: &mut SymbolTable) -> Result {
    let mut buffer = String::new();
    let mut c = leading;
    loop {
        buffer.push(c);
        match source.peek() {
            Some(next)
                if is_initial(next) || next.is_ascii_digit() || next == '+' || next == '-' =>
            {
                c = source.next().unwrap();
            }
            next if is_delimiter(next) => break,
            _ => return Err(Error::MissingDelimiter("symbol")),
        }
    }
    Ok(ScmObject::Symbol(symbols.intern(&buffer)))
}

fn read_string(source: &mut Source) -> Result {
    let mut buffer = String::new();
    loop {
        match source.next() {
            None => return Err(Error::UnterminatedString),
            Some('"') => return Ok(ScmObject::String(buffer)),
            Some('\\') => match source.next() {
                None => return Err(Error::UnterminatedString),
                Some(escape) => match strings::decode_escape(escape) {
                    Some(decoded) => buffer.push(decoded),
                    None => return Err(Error::UnknownEscape(escape)),
                },
            },
            Some(c) => buffer.push(c),
        }
    }
}

/// `#` has been consumed: a boolean or a character literal follows.
fn read_hash(source: &mut Source) -> Result {
    match source.next() {
        Some('t') => Ok(ScmObject::Boolean(true)),
        Some('f') => Ok(ScmObject::Boolean(false)),
        Some('\\') => read_character(source),
        Some(c) => Err(Error::BadHashLiteral(c)),
        None => Err(Error::UnexpectedEof),
    }
}

/// `#\` has been consumed. A single character, or the names `space` and
/// `newline`; either way a delimiter must follow.
fn read_character(source: &mut Source) -> Result {
    let c = source.next().ok_or(Error::UnexpectedEof)?;
    let value = match c {
        's' if source.peek() == Some('p') => {
            eat_expected(source, "pace")?;
            ' '
        }
        'n' if source.peek() == Some('e') => {
            eat_expected(source, "ewline")?;
            '\n'
        }
        c => c,
    };
    if !is_delimiter(source.peek()) {
        return Err(Error::MissingDelimiter("character literal"));
    }
    Ok(ScmObject::Character(value))
}

fn eat_expected(source: &mut Source, expected: &'static str) -> Result<()> {
    let mut actual = String::new();
    for _ in expected.chars() {
        match source.next() {
            Some(c) => actual.push(c),
            None => break,
        }
    }
    if actual == expected {
        Ok(())
    } else {
        Err(Error::UnknownCharacterName(actual))
    }
}

/// `(` has been consumed. Parses the rest of a proper or dotted list.
fn read_pair(source: &mut Source, symbols: &mut SymbolTable) -> Result {
    let (c, pos) = eat_whitespace(source);
    match c {
        None => return Err(Error::MissingClosingParen),
        Some(')') => return Ok(ScmObject::EmptyList),
        Some(_) => source.seek(pos),
    }
    let car = read(source, symbols)?;
    let (c, pos) = eat_whitespace(source);
    match c {
        Some('.') if is_delimiter(source.peek()) => {
            let cdr = read(source, symbols)?;
            match eat_whitespace(source) {
                (Some(')'), _) => Ok(ScmObject::cons(car, cdr)),
                _ => Err(Error::MissingClosingParen),
            }
        }
        Some('.') => Err(Error::DotNotDelimited),
        None => Err(Error::MissingClosingParen),
        Some(_) => {
            source.seek(pos);
            let cdr = read_pair(source, symbols)?;
            Ok(ScmObject::cons(car, cdr))
        }
    }
}
