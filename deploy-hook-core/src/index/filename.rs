use nom::{
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map_res},
    sequence::tuple,
    Finish, IResult,
};

/// Length of a `DD_MM_YY` date token.
const DATE_TOKEN_LEN: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    Doc,
    Docx,
    Pdf,
}

impl Extension {
    pub fn from_tag(tag: &str) -> Option<Extension> {
        [Extension::Doc, Extension::Docx, Extension::Pdf]
            .into_iter()
            .find(|ext| ext.as_str().eq_ignore_ascii_case(tag))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Doc => "doc",
            Extension::Docx => "docx",
            Extension::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub name: String,
    pub date_token: Option<String>,
    pub extension: Extension,
}

/// Recognizes `<name><DD>_<MM>_<YY>.<ext>` and then `<name>.<ext>`. Anything else, including
/// unknown extensions, yields `None`.
pub fn parse_filename(filename: &str) -> Option<ParsedFilename> {
    let (stem, tag) = filename.rsplit_once('.')?;
    let extension = Extension::from_tag(tag)?;

    if let Some((name, token)) = split_date_token(stem) {
        return Some(ParsedFilename {
            name: clean_name(name),
            date_token: Some(token.to_owned()),
            extension,
        });
    }

    if stem.is_empty() {
        return None;
    }
    Some(ParsedFilename {
        name: clean_name(stem),
        date_token: None,
        extension,
    })
}

fn split_date_token(stem: &str) -> Option<(&str, &str)> {
    let split = stem.len().checked_sub(DATE_TOKEN_LEN)?;
    if !stem.is_char_boundary(split) {
        return None;
    }
    let (name, token) = stem.split_at(split);
    date_token(token)?;
    Some((name, token))
}

fn clean_name(name: &str) -> String {
    name.replace('_', " ").trim().to_owned()
}

fn two_digits(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u8>()
    })(input)
}

/// Splits a `DD_MM_YY` token into its numeric day, month and two-digit year.
pub(crate) fn date_token(input: &str) -> Option<(u8, u8, u8)> {
    all_consuming(tuple((
        two_digits,
        char('_'),
        two_digits,
        char('_'),
        two_digits,
    )))(input)
    .finish()
    .ok()
    .map(|(_, (day, _, month, _, year))| (day, month, year))
}
