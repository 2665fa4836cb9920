//! Parsing of block titles and block references.
//!
//! A title reads `[lexer,] name [(option, ...)]`, e.g.
//! `C++, Main loop (APPEND)` or
//! `Logging (INSERT IN {{Main loop}} AFTER "init();")`.
//! A reference reads `name [(HIDDEN)]`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{escaped_transform, tag, tag_no_case, take_till, take_until, take_while1},
    character::complete::{char, multispace0, multispace1, none_of},
    combinator::{eof, map, opt, value},
    multi::separated_list1,
    sequence::{delimited, terminated},
};

use crate::config::Markers;
use crate::errors::{LiterateError, Result};
use crate::model::{BlockLink, InsertLocation, LinkOption, Placement, RegistrationMode};
use crate::text_location::SourceLocation;

/// A single option of a block title.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TitleOption {
    Append,
    Prepend,
    Replace,
    Hidden,
    Insert {
        target: String,
        location: InsertLocation,
    },
    Unknown(String),
}

/// A parsed block title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub name: String,
    pub lexer: Option<String>,
    pub hidden: bool,
    pub mode: RegistrationMode,
}

fn is_head_delimiter(c: char) -> bool {
    c == ',' || c == '('
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Parse a quoted string value with escape handling.
fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        escaped_transform(
            none_of("\\\""),
            '\\',
            alt((
                value("\\", tag("\\")),
                value("\"", tag("\"")),
                value("\n", tag("n")),
                value("\t", tag("t")),
            )),
        ),
        char('"'),
    )
    .parse(input)
}

/// Parse a list separator: `,` with optional whitespace.
fn parse_separator(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0).parse(input)
}

/// Parse a flag option: `APPEND`, `hidden`, ...
fn parse_flag(input: &str) -> IResult<&str, TitleOption> {
    map(take_while1(is_word_char), |word: &str| {
        match word.to_ascii_uppercase().as_str() {
            "APPEND" => TitleOption::Append,
            "PREPEND" => TitleOption::Prepend,
            "REPLACE" => TitleOption::Replace,
            "HIDDEN" => TitleOption::Hidden,
            _ => TitleOption::Unknown(word.to_string()),
        }
    })
    .parse(input)
}

/// Parse `BEFORE` or `AFTER`.
fn parse_placement(input: &str) -> IResult<&str, Placement> {
    alt((
        value(Placement::Before, tag_no_case("BEFORE")),
        value(Placement::After, tag_no_case("AFTER")),
    ))
    .parse(input)
}

/// Parse `INSERT IN {{target}} BEFORE|AFTER "pattern"`.
fn parse_insert<'a>(input: &'a str, markers: &Markers) -> IResult<&'a str, TitleOption> {
    let (input, _) = (tag_no_case("INSERT"), multispace1, tag_no_case("IN"), multispace0).parse(input)?;
    let (input, target) = delimited(
        tag(markers.begin.as_str()),
        take_until(markers.end.as_str()),
        tag(markers.end.as_str()),
    )
    .parse(input)?;
    let (input, placement) = delimited(multispace0, parse_placement, multispace0).parse(input)?;
    let (input, pattern) = parse_quoted_string(input)?;

    Ok((
        input,
        TitleOption::Insert {
            target: target.trim().to_string(),
            location: InsertLocation::new(placement, pattern),
        },
    ))
}

fn parse_option<'a>(input: &'a str, markers: &Markers) -> IResult<&'a str, TitleOption> {
    alt((|i: &'a str| parse_insert(i, markers), parse_flag)).parse(input)
}

type RawTitle<'a> = (Option<&'a str>, &'a str, Vec<TitleOption>);

/// Parse a whole title.
fn parse_title<'a>(input: &'a str, markers: &Markers) -> IResult<&'a str, RawTitle<'a>> {
    let (input, lexer) = opt(terminated(take_till(is_head_delimiter), char(','))).parse(input)?;
    let (input, name) = take_till(is_head_delimiter).parse(input)?;
    let (input, options) = opt(delimited(
        (char('('), multispace0),
        separated_list1(parse_separator, |i: &'a str| parse_option(i, markers)),
        (multispace0, char(')')),
    ))
    .parse(input)?;
    let (input, _) = (multispace0, eof).parse(input)?;
    Ok((input, (lexer, name, options.unwrap_or_default())))
}

/// Parses a block title.
pub fn parse_block_title(raw: &str, markers: &Markers) -> Result<ParsedTitle> {
    let malformed = |message: String| LiterateError::MalformedTitle {
        raw: raw.to_string(),
        message,
    };

    let (_, (lexer, name, options)) = parse_title(raw.trim(), markers).map_err(|_| {
        if raw.to_ascii_uppercase().contains("INSERT") {
            malformed(format!(
                "expected INSERT IN {} BEFORE|AFTER \"pattern\"",
                markers.format_reference("name")
            ))
        } else {
            malformed("expected '[lexer,] name [(options)]'".to_string())
        }
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(malformed("missing block name".to_string()));
    }

    let mut mode = None;
    let mut hidden = false;
    for option in options {
        let next = match option {
            TitleOption::Append => RegistrationMode::Append,
            TitleOption::Prepend => RegistrationMode::Prepend,
            TitleOption::Replace => RegistrationMode::Replace,
            TitleOption::Insert { target, location } => {
                if target.is_empty() {
                    return Err(malformed("missing INSERT target".to_string()));
                }
                if location.pattern.is_empty() {
                    return Err(malformed("empty INSERT pattern".to_string()));
                }
                RegistrationMode::Insert { target, location }
            }
            TitleOption::Hidden => {
                hidden = true;
                continue;
            }
            TitleOption::Unknown(word) => {
                return Err(malformed(format!("unknown option '{}'", word)));
            }
        };
        if mode.is_some() {
            return Err(malformed(
                "only one of APPEND, PREPEND, REPLACE and INSERT can be given".to_string(),
            ));
        }
        mode = Some(next);
    }

    Ok(ParsedTitle {
        name: name.to_string(),
        lexer: lexer.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
        hidden,
        mode: mode.unwrap_or_default(),
    })
}

/// Parse a reference: `name` or `name (OPTION, ...)`.
fn parse_link(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    let (input, name) = take_till(|c| c == '(').parse(input)?;
    let (input, options) = opt(delimited(
        (char('('), multispace0),
        separated_list1(parse_separator, take_while1(is_word_char)),
        (multispace0, char(')')),
    ))
    .parse(input)?;
    let (input, _) = (multispace0, eof).parse(input)?;
    Ok((input, (name, options.unwrap_or_default())))
}

/// Parses the text found between reference delimiters.
///
/// The reference is resolved from `tangle_root`, the root of the block that
/// contains it.
pub fn parse_block_link(
    raw: &str,
    tangle_root: Option<String>,
    location: &SourceLocation,
) -> Result<BlockLink> {
    let malformed = |message: String| LiterateError::MalformedReference {
        raw: raw.to_string(),
        location: location.clone(),
        message,
    };

    let (_, (name, options)) = parse_link(raw.trim())
        .map_err(|_| malformed("expected 'name [(HIDDEN)]'".to_string()))?;
    if name.trim().is_empty() {
        return Err(malformed("missing block name".to_string()));
    }

    let mut link = BlockLink::new(name, tangle_root);
    for option in options {
        match option.to_ascii_uppercase().as_str() {
            "HIDDEN" => link = link.with_option(LinkOption::Hidden),
            _ => return Err(malformed(format!("unknown option '{}'", option))),
        }
    }
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(raw: &str) -> Result<ParsedTitle> {
        parse_block_title(raw, &Markers::default())
    }

    #[test]
    fn test_plain_title() {
        let parsed = title("Main content").unwrap();
        assert_eq!(parsed.name, "Main content");
        assert_eq!(parsed.lexer, None);
        assert_eq!(parsed.mode, RegistrationMode::New);
        assert!(!parsed.hidden);
    }

    #[test]
    fn test_lexer_and_options() {
        let parsed = title("C++, Main content (append, HIDDEN)").unwrap();
        assert_eq!(parsed.lexer.as_deref(), Some("C++"));
        assert_eq!(parsed.name, "Main content");
        assert_eq!(parsed.mode, RegistrationMode::Append);
        assert!(parsed.hidden);
    }

    #[test]
    fn test_file_title() {
        let parsed = title("rust, file: src/main.rs (REPLACE)").unwrap();
        assert_eq!(parsed.name, "file: src/main.rs");
        assert_eq!(parsed.mode, RegistrationMode::Replace);
    }

    #[test]
    fn test_insert_option() {
        let parsed = title(r#"C, Logging (INSERT IN {{Main loop}} AFTER "init(\"x\");")"#).unwrap();
        assert_eq!(parsed.name, "Logging");
        assert_eq!(
            parsed.mode,
            RegistrationMode::Insert {
                target: "Main loop".to_string(),
                location: InsertLocation::new(Placement::After, "init(\"x\");"),
            }
        );
    }

    #[test]
    fn test_insert_with_custom_markers() {
        let parsed = parse_block_title(
            "Hook (insert in <<Setup>> before \"return\")",
            &Markers::new("<<", ">>"),
        )
        .unwrap();
        assert!(matches!(
            parsed.mode,
            RegistrationMode::Insert { ref target, ref location }
                if target == "Setup" && location.placement == Placement::Before
        ));
    }

    #[test]
    fn test_conflicting_modes() {
        let err = title("X (APPEND, REPLACE)").unwrap_err();
        assert!(matches!(err, LiterateError::MalformedTitle { .. }));
        assert!(err.to_string().contains("only one of"));
    }

    #[test]
    fn test_unknown_option() {
        let err = title("X (SOMETIMES)").unwrap_err();
        assert!(err.to_string().contains("unknown option 'SOMETIMES'"));
    }

    #[test]
    fn test_malformed_titles() {
        assert!(title("a, b, c").is_err());
        assert!(title("X (APPEND").is_err());
        assert!(title("X (APPEND) trailing").is_err());
        assert!(title(", (APPEND)").is_err());
        let err = title("X (INSERT IN {{Y}} SOMEWHERE \"a\")").unwrap_err();
        assert!(err.to_string().contains("INSERT IN {{name}}"));
    }

    #[test]
    fn test_parse_link() {
        let location = SourceLocation::default();
        let link = parse_block_link(" Utils ", Some("r".to_string()), &location).unwrap();
        assert_eq!(link.name, "Utils");
        assert_eq!(link.tangle_root.as_deref(), Some("r"));
        assert!(!link.is_hidden());

        let link = parse_block_link("Utils (hidden)", None, &location).unwrap();
        assert_eq!(link.name, "Utils");
        assert!(link.is_hidden());

        assert!(parse_block_link("Utils (LOUD)", None, &location).is_err());
        assert!(parse_block_link("(HIDDEN)", None, &location).is_err());
    }
}
