//! Locale-style string ordering used for every user-visible sort.
//!
//! Primary order ignores case and ranks punctuation before digits before letters.
//! Ties are broken lowercase-first, then by code point, so the ordering is total.

use std::cmp::Ordering;

fn class(c: char) -> u8 {
    if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    }
}

fn primary(c: char) -> (u8, char) {
    let folded = c.to_lowercase().next().unwrap_or(c);
    (class(c), folded)
}

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary_order = a.chars().map(primary).cmp(b.chars().map(primary));
    if primary_order != Ordering::Equal {
        return primary_order;
    }

    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
    }

    a.cmp(b)
}
