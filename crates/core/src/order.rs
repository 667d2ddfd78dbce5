//! Natural ordering for file and folder names.
//!
//! Course material is usually numbered (`2 - Setup`, `10 - Deploy`), so plain
//! lexical order puts lesson 10 before lesson 2. Runs of ASCII digits compare
//! by numeric value, everything else compares case-insensitively.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}

fn compare_chunk(left: Chunk<'_>, right: Chunk<'_>) -> Ordering {
    match (left, right) {
        (Chunk::Digits(l), Chunk::Digits(r)) => {
            let l = l.trim_start_matches('0');
            let r = r.trim_start_matches('0');
            l.len().cmp(&r.len()).then_with(|| l.cmp(r))
        }
        (Chunk::Text(l), Chunk::Text(r)) => l
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(r.chars().flat_map(char::to_lowercase)),
        (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
    }
}

/// Compare two names in natural order.
///
/// Names that are equal under natural ordering (`"01"` vs `"1"`, `"a"` vs `"A"`)
/// fall back to byte order so the result is total and stable.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks { rest: a };
    let mut right = Chunks { rest: b };
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_chunk(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = names.iter().map(|s| (*s).to_string()).collect();
        out.sort_by(|a, b| natural_cmp(a, b));
        out
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(
            sorted(&["Lesson 10.mp4", "Lesson 2.mp4", "Lesson 1.mp4"]),
            vec!["Lesson 1.mp4", "Lesson 2.mp4", "Lesson 10.mp4"]
        );
    }

    #[test]
    fn text_compares_case_insensitively() {
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
        assert_eq!(natural_cmp("Beta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn zero_padding_ties_break_deterministically() {
        assert_ne!(natural_cmp("01", "1"), Ordering::Equal);
        assert_eq!(natural_cmp("01-intro.mp4", "02-lab.pdf"), Ordering::Less);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("intro", "intro 2"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }
}
