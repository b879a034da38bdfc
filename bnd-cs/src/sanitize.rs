//! Keyword escaping and per-declaration unique
//! parameter names.

use crate::profile::TargetProfile;

/// Name used for unnamed parameters.
const UNNAMED_PARAM: &str = "param";

/// Escape `name` if it is a reserved word of the target language.
pub fn sanitize(profile: &TargetProfile, name: &str) -> String {
    if profile.is_keyword(name) {
        format!("{}{}", profile.escape_prefix, name)
    } else {
        name.to_string()
    }
}

/// Pick a parameter name that does not collide with `used`, then record it.
///
/// `used` holds the names already given to earlier parameters of the same
/// function. Collisions bump a trailing decimal suffix (`x2` → `x3`) or, if
/// there is none, append `2`.
pub fn unique_parameter_name(candidate: &str, used: &mut Vec<String>) -> String {
    let mut name = if candidate.is_empty() {
        UNNAMED_PARAM.to_string()
    } else {
        candidate.to_string()
    };

    while used.contains(&name) {
        name = bump_suffix(&name);
    }

    debug_assert!(!used.contains(&name));
    used.push(name.clone());
    name
}

fn bump_suffix(name: &str) -> String {
    let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[prefix.len()..];
    if digits.is_empty() {
        format!("{name}2")
    } else {
        format!("{prefix}{}", increment_decimal(digits))
    }
}

/// Add one to an unsigned decimal string of any width. Leading zeros are
/// dropped from the result.
fn increment_decimal(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let mut out: Vec<u8> = if trimmed.is_empty() {
        vec![b'0']
    } else {
        trimmed.bytes().collect()
    };

    let mut i = out.len();
    loop {
        if i == 0 {
            // every digit carried
            out.insert(0, b'1');
            break;
        }
        i -= 1;
        if out[i] == b'9' {
            out[i] = b'0';
        } else {
            out[i] += 1;
            break;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_all(names: &[&str]) -> Vec<String> {
        let mut used = Vec::new();
        names
            .iter()
            .map(|n| unique_parameter_name(n, &mut used))
            .collect()
    }

    #[test]
    fn repeated_names_get_increasing_suffixes() {
        assert_eq!(unique_all(&["x", "x", "x"]), ["x", "x2", "x3"]);
    }

    #[test]
    fn unnamed_params_become_param() {
        assert_eq!(unique_all(&["", ""]), ["param", "param2"]);
        assert_eq!(unique_all(&["", "", ""]), ["param", "param2", "param3"]);
    }

    #[test]
    fn existing_numeric_suffix_is_incremented() {
        assert_eq!(unique_all(&["a1", "a1"]), ["a1", "a2"]);
        assert_eq!(unique_all(&["v9", "v9"]), ["v9", "v10"]);
        assert_eq!(unique_all(&["n19", "n19", "n19"]), ["n19", "n20", "n21"]);
    }

    #[test]
    fn bumped_name_skips_names_already_taken() {
        // "x" collides, "x2" is taken by an earlier explicit name.
        assert_eq!(unique_all(&["x", "x2", "x"]), ["x", "x2", "x3"]);
        assert_eq!(unique_all(&["", "param2", ""]), ["param", "param2", "param3"]);
    }

    #[test]
    fn leading_zeros_are_dropped_when_bumping() {
        assert_eq!(unique_all(&["p007", "p007"]), ["p007", "p8"]);
        assert_eq!(unique_all(&["p0", "p0"]), ["p0", "p1"]);
    }

    #[test]
    fn huge_suffix_does_not_overflow() {
        let big = "x99999999999999999999999999";
        let out = unique_all(&[big, big]);
        assert_eq!(out[1], "x100000000000000000000000000");
    }

    #[test]
    fn names_in_a_list_are_pairwise_distinct() {
        let input = ["a", "", "a", "a2", "", "param", "a", "b1", "b1", "b"];
        let out = unique_all(&input);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert_ne!(a, b, "duplicate in {out:?}");
            }
        }
    }

    #[test]
    fn keywords_are_escaped() {
        let p = TargetProfile::CSHARP;
        assert_eq!(sanitize(&p, "int"), "@int");
        assert_eq!(sanitize(&p, "object"), "@object");
        assert_eq!(sanitize(&p, "length"), "length");
        assert_eq!(sanitize(&p, ""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let p = TargetProfile::CSHARP;
        for name in ["int", "string", "length", "Data", "@int"] {
            let once = sanitize(&p, name);
            assert_eq!(sanitize(&p, &once), once);
        }
    }
}
