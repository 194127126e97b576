//! Point-list grammar shared by path announcements and region files
//!
//! A point list is a colon-separated sequence of `x,y` pairs, for example
//! `0,0:10,0:10,10`. Path announcements wrap it in a key prefix and
//! optional braces: `points=1,1:2,2`, `pts={0,0:10,0}`, `points = {...}`.

use crate::types::{parse_real, Point};

/// Key prefixes stripped from path values (after whitespace removal,
/// `points =` has become `points=`)
const PATH_KEY_PREFIXES: [&str; 2] = ["points=", "pts="];

/// Parse a bare `x,y:x,y:...` list
///
/// Empty tokens (e.g. a trailing `:`) are skipped. Returns `None` if any
/// token is not a pair of real numbers or if no vertex remains.
pub fn parse_point_list(text: &str) -> Option<Vec<Point>> {
    let mut points = Vec::new();

    for token in text.split(':') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (x, y) = token.split_once(',')?;
        points.push(Point::new(parse_real(x)?, parse_real(y)?));
    }

    if points.is_empty() {
        None
    } else {
        Some(points)
    }
}

/// Decode the value of a `TOWAYPT_UPDATE` / `SURVEY_UPDATE` event
///
/// If the value holds a braced token, only its contents are used; other
/// keys around it are ignored. Whitespace and known key prefixes are then
/// stripped before the point list is parsed.
pub fn parse_path_value(value: &str) -> Option<Vec<Point>> {
    let body = braced_body(value).unwrap_or(value);
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace(['{', '}'], "");

    let mut list = compact.as_str();
    for prefix in PATH_KEY_PREFIXES {
        if let Some(rest) = list.strip_prefix(prefix) {
            list = rest;
            break;
        }
    }

    parse_point_list(list)
}

/// Contents of the `{...}` following `key`, e.g. `pts={...}`
pub fn keyed_braced_body<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)? + key.len();
    let rest = text[start..].trim_start().strip_prefix('{')?;
    let end = rest.find('}')?;
    Some(&rest[..end])
}

/// Contents of the first `{...}` in `text`
fn braced_body(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let rest = &text[open + 1..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_bare_point_list() {
        assert_eq!(
            parse_point_list("0,0:10,0:10,10"),
            Some(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]))
        );
        assert_eq!(parse_point_list("1.5,-2:"), Some(pts(&[(1.5, -2.0)])));
    }

    #[test]
    fn test_bad_token_rejects_list() {
        assert_eq!(parse_point_list("0,0:ten,0"), None);
        assert_eq!(parse_point_list("0,0:5"), None);
        assert_eq!(parse_point_list(""), None);
    }

    #[test]
    fn test_path_value_prefixes() {
        let expected = Some(pts(&[(1.0, 1.0), (2.0, 2.0)]));
        assert_eq!(parse_path_value("points=1,1:2,2"), expected);
        assert_eq!(parse_path_value("points = 1,1 : 2,2"), expected);
        assert_eq!(parse_path_value("pts={1,1:2,2}"), expected);
        assert_eq!(parse_path_value("1,1:2,2"), expected);
    }

    #[test]
    fn test_path_value_ignores_surrounding_keys() {
        assert_eq!(
            parse_path_value("label=survey,pts={0,0:10,0},speed=12"),
            Some(pts(&[(0.0, 0.0), (10.0, 0.0)]))
        );
    }

    #[test]
    fn test_keyed_braced_body() {
        let line = "poly = label=area, pts={0,0:10,0:10,10}";
        assert_eq!(keyed_braced_body(line, "pts="), Some("0,0:10,0:10,10"));
        assert_eq!(keyed_braced_body("pts=0,0", "pts="), None);
    }
}
