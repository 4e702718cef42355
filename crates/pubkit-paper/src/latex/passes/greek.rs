//! Unicode Greek letters to LaTeX macros

use super::Pass;
use crate::latex::scan::map_segments;
use crate::latex::DocKind;
use std::borrow::Cow;

/// Macro name (without backslash) or plain replacement for a Greek letter
#[must_use]
pub fn greek_macro(c: char) -> Option<&'static str> {
    Some(match c {
        'α' => r"\alpha",
        'β' => r"\beta",
        'γ' => r"\gamma",
        'δ' => r"\delta",
        'ε' | 'ϵ' => r"\epsilon",
        'ζ' => r"\zeta",
        'η' => r"\eta",
        'θ' => r"\theta",
        'ϑ' => r"\vartheta",
        'ι' => r"\iota",
        'κ' => r"\kappa",
        'λ' => r"\lambda",
        'μ' | 'µ' => r"\mu",
        'ν' => r"\nu",
        'ξ' => r"\xi",
        'ο' => "o",
        'π' => r"\pi",
        'ρ' => r"\rho",
        'σ' => r"\sigma",
        'ς' => r"\varsigma",
        'τ' => r"\tau",
        'υ' => r"\upsilon",
        'φ' | 'ϕ' => r"\phi",
        'χ' => r"\chi",
        'ψ' => r"\psi",
        'ω' => r"\omega",
        'Γ' => r"\Gamma",
        'Δ' => r"\Delta",
        'Θ' => r"\Theta",
        'Λ' => r"\Lambda",
        'Ξ' => r"\Xi",
        'Π' => r"\Pi",
        'Σ' => r"\Sigma",
        'Υ' => r"\Upsilon",
        'Φ' => r"\Phi",
        'Ψ' => r"\Psi",
        'Ω' => r"\Omega",
        'Α' => "A",
        'Β' => "B",
        'Ε' => "E",
        'Ζ' => "Z",
        'Η' => "H",
        'Ι' => "I",
        'Κ' => "K",
        'Μ' => "M",
        'Ν' => "N",
        'Ο' => "O",
        'Ρ' => "P",
        'Τ' => "T",
        'Χ' => "X",
        _ => return None,
    })
}

/// Converts Greek letters: `\ensuremath{...}` in LaTeX text, bare macros inside math
#[derive(Debug, Clone, Copy, Default)]
pub struct GreekLetters;

impl Pass for GreekLetters {
    fn name(&self) -> &'static str {
        "greek"
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        match kind {
            DocKind::Latex => {
                let mut math = LatexMath::default();
                map_segments(text, kind, |segment| math.convert(segment))
            }
            DocKind::Markdown => map_segments(text, kind, convert_markdown_math),
        }
    }
}

/// Environments typeset in math mode
const MATH_ENVIRONMENTS: &[&str] = &[
    "equation", "equation*", "align", "align*", "alignat", "alignat*", "gather", "gather*", "multline",
    "multline*", "flalign", "flalign*", "eqnarray", "eqnarray*", "math", "displaymath",
];

/// What closes the math span we are in
#[derive(Debug, Clone, PartialEq, Eq)]
enum MathClose {
    Dollar,
    DoubleDollar,
    Paren,
    Bracket,
    Environment(String),
}

/// Math-mode state carried across the segments of one LaTeX document
#[derive(Debug, Default)]
struct LatexMath {
    open: Option<MathClose>,
}

impl LatexMath {
    fn convert<'s>(&mut self, segment: &'s str) -> Cow<'s, str> {
        let mut out = String::with_capacity(segment.len() + 16);
        let mut changed = false;
        let mut i = 0;
        while let Some(c) = segment[i..].chars().next() {
            let rest = &segment[i..];
            let step = match c {
                '\\' => self.command(rest),
                '$' => self.dollar(rest),
                _ => match greek_macro(c) {
                    Some(m) => {
                        changed = true;
                        let next = rest[c.len_utf8()..].chars().next();
                        push_greek(&mut out, m, self.open.is_some(), next);
                        i += c.len_utf8();
                        continue;
                    }
                    None => c.len_utf8(),
                },
            };
            out.push_str(&rest[..step]);
            i += step;
        }
        if changed {
            Cow::Owned(out)
        } else {
            Cow::Borrowed(segment)
        }
    }

    /// Length of the control sequence at the start of `rest`
    fn command(&mut self, rest: &str) -> usize {
        let Some(c) = rest[1..].chars().next() else {
            return 1;
        };
        match c {
            '(' | '[' => {
                if self.open.is_none() {
                    self.open = Some(if c == '(' { MathClose::Paren } else { MathClose::Bracket });
                }
                2
            }
            ')' | ']' => {
                let closes = if c == ')' { MathClose::Paren } else { MathClose::Bracket };
                if self.open.as_ref() == Some(&closes) {
                    self.open = None;
                }
                2
            }
            c if c.is_ascii_alphabetic() => {
                let name_len = rest[1..]
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(rest.len() - 1);
                let name = &rest[1..=name_len];
                let after = &rest[1 + name_len..];
                if matches!(name, "begin" | "end") && after.starts_with('{') {
                    if let Some(close) = after.find('}') {
                        self.environment(name == "begin", &after[1..close]);
                        return 1 + name_len + close + 1;
                    }
                }
                1 + name_len
            }
            c => 1 + c.len_utf8(),
        }
    }

    fn environment(&mut self, begin: bool, name: &str) {
        let closes = matches!(&self.open, Some(MathClose::Environment(open)) if open == name);
        if begin && self.open.is_none() && MATH_ENVIRONMENTS.contains(&name) {
            self.open = Some(MathClose::Environment(name.to_string()));
        } else if !begin && closes {
            self.open = None;
        }
    }

    /// `$$` opens or closes display math only when not inside `$...$`
    fn dollar(&mut self, rest: &str) -> usize {
        let double = rest.starts_with("$$");
        let (open, step) = match self.open.take() {
            None if double => (Some(MathClose::DoubleDollar), 2),
            None => (Some(MathClose::Dollar), 1),
            Some(MathClose::Dollar) => (None, 1),
            Some(MathClose::DoubleDollar) if double => (None, 2),
            other => (other, 1),
        };
        self.open = open;
        step
    }
}

/// Bare macro in math, `\ensuremath{...}` in text
fn push_greek(out: &mut String, replacement: &str, in_math: bool, next: Option<char>) {
    if !replacement.starts_with('\\') {
        out.push_str(replacement);
    } else if in_math {
        out.push_str(replacement);
        if next.is_some_and(|c| c.is_ascii_alphabetic()) {
            out.push(' ');
        }
    } else {
        out.push_str(r"\ensuremath{");
        out.push_str(replacement);
        out.push('}');
    }
}

fn convert_markdown_math(segment: &str) -> Cow<'_, str> {
    if !segment.contains('$') || !segment.chars().any(|c| greek_macro(c).is_some()) {
        return Cow::Borrowed(segment);
    }
    let mut out = String::with_capacity(segment.len() + 16);
    let mut in_math = false;
    let mut changed = false;
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '$' => {
                out.push(c);
                if chars.peek() == Some(&'$') {
                    out.push('$');
                    chars.next();
                }
                in_math = !in_math;
            }
            _ if in_math => match greek_macro(c) {
                Some(m) => {
                    changed = true;
                    out.push_str(m);
                    if m.starts_with('\\') && chars.peek().is_some_and(char::is_ascii_alphabetic) {
                        out.push(' ');
                    }
                }
                None => out.push(c),
            },
            _ => out.push(c),
        }
    }
    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn latex_letters_become_ensuremath() {
        let out = GreekLetters.apply("latency of α and Δt\n", DocKind::Latex);
        assert_eq!(out, "latency of \\ensuremath{\\alpha} and \\ensuremath{\\Delta}t\n");
    }

    #[test]
    fn latex_math_keeps_bare_macros() {
        let input = "hit rate $\\alpha$ and \\(\\beta\\)\n";
        assert!(matches!(GreekLetters.apply(input, DocKind::Latex), Cow::Borrowed(_)));

        let out = GreekLetters.apply("rate $αx$, \\[Σ\\] and α\n", DocKind::Latex);
        assert_eq!(out, "rate $\\alpha x$, \\[\\Sigma\\] and \\ensuremath{\\alpha}\n");
    }

    #[test]
    fn latex_math_environments_span_lines() {
        let input = "\\begin{equation}\nλ = μ\n\\end{equation}\nwith λ\n% $ in a comment\nthen $$β$$ and $a$$b$ then γ\n";
        let out = GreekLetters.apply(input, DocKind::Latex);
        assert_eq!(
            out,
            "\\begin{equation}\n\\lambda = \\mu\n\\end{equation}\nwith \\ensuremath{\\lambda}\n% $ in a comment\nthen $$\\beta$$ and $a$$b$ then \\ensuremath{\\gamma}\n"
        );
        assert!(matches!(GreekLetters.apply(&out, DocKind::Latex), Cow::Borrowed(_)));
    }

    #[test]
    fn escaped_dollar_in_latex_is_text() {
        let out = GreekLetters.apply("costs \\$5 for α\n", DocKind::Latex);
        assert_eq!(out, "costs \\$5 for \\ensuremath{\\alpha}\n");
    }

    #[test]
    fn latex_comments_and_verbatim_untouched() {
        let input = "% α in comment\n\\begin{verbatim}\nβ\n\\end{verbatim}\n";
        assert!(matches!(GreekLetters.apply(input, DocKind::Latex), Cow::Borrowed(_)));
    }

    #[test]
    fn markdown_only_inside_math() {
        let out = GreekLetters.apply("The α parameter, $αx + β_1$ and $$\nΣ\n$$\n", DocKind::Markdown);
        assert_eq!(out, "The α parameter, $\\alpha x + \\beta_1$ and $$\n\\Sigma\n$$\n");
    }

    #[test]
    fn escaped_dollar_is_not_math() {
        let input = "costs \\$5 for α\n";
        assert!(matches!(GreekLetters.apply(input, DocKind::Markdown), Cow::Borrowed(_)));
    }

    #[test]
    fn uppercase_latin_lookalikes_map_to_letters() {
        assert_eq!(greek_macro('Α'), Some("A"));
        assert_eq!(greek_macro('x'), None);
    }
}
