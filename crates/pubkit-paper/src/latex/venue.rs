//! Submission venues and their author-block conventions

use crate::error::LatexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target venue for a camera-ready paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// arXiv preprint (plain `article` class)
    #[default]
    Arxiv,
    /// ACM `acmart` sigconf
    Acm,
    /// IEEE `IEEEtran` conference
    Ieee,
}

impl Venue {
    /// All venues
    pub const ALL: [Venue; 3] = [Venue::Arxiv, Venue::Acm, Venue::Ieee];

    /// Lowercase identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arxiv => "arxiv",
            Self::Acm => "acm",
            Self::Ieee => "ieee",
        }
    }

    /// `\documentclass` line for the venue
    #[must_use]
    pub const fn document_class(self) -> &'static str {
        match self {
            Self::Arxiv => r"\documentclass[11pt]{article}",
            Self::Acm => r"\documentclass[sigconf]{acmart}",
            Self::Ieee => r"\documentclass[conference]{IEEEtran}",
        }
    }

    /// Render the author block for this venue
    #[must_use]
    pub fn render_authors(self, authors: &[Author]) -> String {
        match self {
            Self::Arxiv => {
                let people: Vec<String> = authors
                    .iter()
                    .map(|a| {
                        let mut lines = vec![escape(&a.name), escape(&a.affiliation)];
                        if let Some(email) = &a.email {
                            lines.push(format!(r"\texttt{{{}}}", escape(email)));
                        }
                        lines.join(r"\\ ")
                    })
                    .collect();
                format!(r"\author{{{}}}", people.join(r" \and "))
            }
            Self::Acm => authors
                .iter()
                .map(|a| {
                    let mut block = format!(r"\author{{{}}}", escape(&a.name));
                    if let Some(orcid) = &a.orcid {
                        block.push_str(&format!("\n\\orcid{{{}}}", escape(orcid)));
                    }
                    block.push_str(&format!(
                        "\n\\affiliation{{\\institution{{{}}}}}",
                        escape(&a.affiliation)
                    ));
                    if let Some(email) = &a.email {
                        block.push_str(&format!("\n\\email{{{}}}", escape(email)));
                    }
                    block
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Ieee => {
                let people: Vec<String> = authors
                    .iter()
                    .map(|a| {
                        let mut detail = escape(&a.affiliation);
                        if let Some(email) = &a.email {
                            detail.push_str(&format!(r"\\ {}", escape(email)));
                        }
                        format!(
                            "\\IEEEauthorblockN{{{}}}\n\\IEEEauthorblockA{{{}}}",
                            escape(&a.name),
                            detail
                        )
                    })
                    .collect();
                format!("\\author{{{}}}", people.join("\n\\and\n"))
            }
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = LatexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(Self::Arxiv),
            "acm" => Ok(Self::Acm),
            "ieee" => Ok(Self::Ieee),
            _ => Err(LatexError::UnknownVenue(s.to_string())),
        }
    }
}

/// Paper author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub affiliation: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

/// Escape LaTeX special characters in plain text
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ada() -> Author {
        Author {
            name: "Ada Lovelace".to_string(),
            affiliation: "Analytical Engines & Co".to_string(),
            email: Some("ada_l@example.org".to_string()),
            orcid: None,
        }
    }

    #[test]
    fn venue_parse_and_display() {
        assert_eq!("ACM".parse::<Venue>().unwrap(), Venue::Acm);
        assert_eq!(Venue::Ieee.to_string(), "ieee");
        assert!("springer".parse::<Venue>().is_err());
    }

    #[test]
    fn arxiv_author_block() {
        assert_eq!(
            Venue::Arxiv.render_authors(&[ada()]),
            r"\author{Ada Lovelace\\ Analytical Engines \& Co\\ \texttt{ada\_l@example.org}}"
        );
    }

    #[test]
    fn acm_author_block_lists_siblings() {
        let block = Venue::Acm.render_authors(&[ada()]);
        assert_eq!(
            block,
            "\\author{Ada Lovelace}\n\\affiliation{\\institution{Analytical Engines \\& Co}}\n\\email{ada\\_l@example.org}"
        );
    }

    #[test]
    fn ieee_author_block_joins_with_and() {
        let block = Venue::Ieee.render_authors(&[ada(), ada()]);
        assert!(block.starts_with("\\author{\\IEEEauthorblockN{Ada Lovelace}"));
        assert_eq!(block.matches("\\and").count(), 1);
    }

    #[test]
    fn escape_specials() {
        assert_eq!(escape("50% of $x_1$"), r"50\% of \$x\_1\$");
    }
}
