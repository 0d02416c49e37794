// Range delimiters for free-text event dates.
//
// Tried in order, first one present wins. A slash only splits when the text
// holds an odd number of them, at the middle one: "2/3/2008" stays a single
// date while "2010/2011" and "2/3/2008/5/3/2008" become ranges.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Text(&'static str),
    MiddleSlash,
}

const RANGE_DELIMITERS: [Delimiter; 4] = [
    Delimiter::Text(" to "),
    Delimiter::Text(" & "),
    Delimiter::Text(" - "),
    Delimiter::MiddleSlash,
];

impl Delimiter {
    fn split<'a>(&self, raw: &'a str) -> Option<(&'a str, &'a str)> {
        match self {
            Delimiter::Text(delimiter) => raw.split_once(delimiter),
            Delimiter::MiddleSlash => {
                let slashes: Vec<usize> = raw.match_indices('/').map(|(i, _)| i).collect();
                if slashes.len() % 2 == 0 {
                    return None;
                }
                let at = slashes[slashes.len() / 2];
                Some((&raw[..at], &raw[at + 1..]))
            }
        }
    }
}

/// Split raw event-date text into trimmed (from, to). No delimiter → to is "".
pub fn split_period(raw: &str) -> (String, String) {
    let raw = raw.trim();
    RANGE_DELIMITERS
        .iter()
        .find_map(|delimiter| delimiter.split(raw))
        .map(|(from, to)| (from.trim().to_string(), to.trim().to_string()))
        .unwrap_or_else(|| (raw.to_string(), String::new()))
}
