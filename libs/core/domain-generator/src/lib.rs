// [libs/core/domain-generator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC DOMAIN GENERATOR (ESTRATO L2)
 * RESPONSABILIDAD: ENUMERACIÓN DIRECCIONABLE POR OFFSET, SIN ESTADO
 *
 * Implementa spec.md §4.C. Dado un patrón y un offset en [0, N), produce
 * el dominio candidato mediante codificación posicional en base
 * |character_set|. No mantiene estado interno: la secuencia es
 * reanudable desde cualquier offset.
 * =================================================================
 */

pub mod errors;

pub use errors::GeneratorError;

use campaign_domain_models::{pattern_total, PatternDescriptor, PatternKind};

/// Encodes `offset` as a fixed-length string over `character_set`, most
/// significant digit first (standard mixed-radix, big-endian). This is
/// the only encoding order this repo implements — spec.md §6 requires
/// determinism and "lexicographic order per the order the character
/// set is given", which this satisfies: incrementing `offset` advances
/// the rightmost digit fastest, exactly like a base-K counter.
fn encode_offset(mut remaining: u128, character_set: &[char], length: u32) -> String {
    let base = character_set.len() as u128;
    let mut digits = vec![0usize; length as usize];

    for slot in digits.iter_mut().rev() {
        *slot = (remaining % base) as usize;
        remaining /= base;
    }

    digits.into_iter().map(|digit| character_set[digit]).collect()
}

/// Renders the full domain string for a single offset. Does not
/// validate that `offset < N` — callers (`generate`) are expected to
/// bound the range first.
pub fn generate_one(pattern: &PatternDescriptor, offset: u64) -> Result<String, GeneratorError> {
    let character_set: Vec<char> = pattern.character_set.chars().collect();
    if character_set.is_empty() {
        return Err(GeneratorError::EmptyCharacterSet);
    }

    let rendered = match pattern.kind {
        PatternKind::Prefix => {
            let variable = encode_offset(offset as u128, &character_set, pattern.variable_length);
            format!("{variable}{}.{}", pattern.constant, pattern.tld)
        }
        PatternKind::Suffix => {
            let variable = encode_offset(offset as u128, &character_set, pattern.variable_length);
            format!("{}{variable}.{}", pattern.constant, pattern.tld)
        }
        PatternKind::PrefixSuffix => {
            // Low bit selects placement; the remaining bits re-range the
            // offset before encoding. Documented and fixed: bit set (1)
            // means suffix placement, bit clear (0) means prefix.
            let placement_is_suffix = offset & 1 == 1;
            let variable = encode_offset((offset >> 1) as u128, &character_set, pattern.variable_length);
            if placement_is_suffix {
                format!("{}{variable}.{}", pattern.constant, pattern.tld)
            } else {
                format!("{variable}{}.{}", pattern.constant, pattern.tld)
            }
        }
    };

    Ok(rendered)
}

/// Finite, restartable iterator over `(offset, domain)` pairs for
/// `offset in [start, start + count)`. Stateless beyond the iterator's
/// own cursor — repeating the same `(pattern, start, count)` always
/// yields the same sequence (spec.md §8.3).
pub fn generate(
    pattern: &PatternDescriptor,
    start: u64,
    count: u64,
) -> Result<impl Iterator<Item = (u64, String)> + '_, GeneratorError> {
    let total = pattern_total(pattern);
    let end = start.saturating_add(count);
    if (end as u128) > total {
        return Err(GeneratorError::RangeExceedsSpace { start, end, total });
    }

    Ok((start..end).map(move |offset| {
        let domain = generate_one(pattern, offset).expect("validated character set");
        (offset, domain)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_pattern() -> PatternDescriptor {
        PatternDescriptor {
            kind: PatternKind::Prefix,
            variable_length: 2,
            character_set: "ab".into(),
            constant: "x".into(),
            tld: "test".into(),
        }
    }

    #[test]
    fn scenario_tiny_generation_matches_spec_order() {
        let pattern = prefix_pattern();
        let values: Vec<String> = generate(&pattern, 0, 4).unwrap().map(|(_, d)| d).collect();
        assert_eq!(values, vec!["aax.test", "abx.test", "bax.test", "bbx.test"]);
    }

    #[test]
    fn scenario_resume_generation_is_independent_of_prior_calls() {
        let pattern = prefix_pattern();
        let resumed: Vec<String> = generate(&pattern, 2, 2).unwrap().map(|(_, d)| d).collect();
        assert_eq!(resumed, vec!["bax.test", "bbx.test"]);
    }

    #[test]
    fn generation_rejects_ranges_past_the_pattern_space() {
        let pattern = prefix_pattern();
        assert!(generate(&pattern, 3, 2).is_err());
    }

    #[test]
    fn boundary_start_plus_count_equals_total_is_allowed() {
        let pattern = prefix_pattern();
        assert!(generate(&pattern, 0, 4).is_ok());
    }

    #[test]
    fn single_character_set_collapses_to_one_domain_regardless_of_length() {
        let pattern = PatternDescriptor {
            kind: PatternKind::Prefix,
            variable_length: 5,
            character_set: "a".into(),
            constant: "x".into(),
            tld: "test".into(),
        };
        let values: Vec<String> = generate(&pattern, 0, 1).unwrap().map(|(_, d)| d).collect();
        assert_eq!(values, vec!["aaaaax.test"]);
        assert!(generate(&pattern, 0, 2).is_err());
    }

    #[test]
    fn prefix_suffix_low_bit_selects_placement() {
        let pattern = PatternDescriptor {
            kind: PatternKind::PrefixSuffix,
            variable_length: 1,
            character_set: "ab".into(),
            constant: "x".into(),
            tld: "test".into(),
        };
        // offset 0 -> bit=0 (prefix), remaining=0 -> "a"
        assert_eq!(generate_one(&pattern, 0).unwrap(), "ax.test");
        // offset 1 -> bit=1 (suffix), remaining=0 -> "a"
        assert_eq!(generate_one(&pattern, 1).unwrap(), "xa.test");
        // offset 2 -> bit=0 (prefix), remaining=1 -> "b"
        assert_eq!(generate_one(&pattern, 2).unwrap(), "bx.test");
        // offset 3 -> bit=1 (suffix), remaining=1 -> "b"
        assert_eq!(generate_one(&pattern, 3).unwrap(), "xb.test");
    }

    proptest::proptest! {
        #[test]
        fn generation_is_deterministic_and_injective(offset_a in 0u64..16, offset_b in 0u64..16) {
            let pattern = prefix_pattern();
            if offset_a != offset_b {
                let a = generate_one(&pattern, offset_a).unwrap();
                let b = generate_one(&pattern, offset_b).unwrap();
                prop_assert_ne!(a, b);
            }
            let first_call = generate_one(&pattern, offset_a).unwrap();
            let second_call = generate_one(&pattern, offset_a).unwrap();
            prop_assert_eq!(first_call, second_call);
        }
    }
}
