use rand::seq::SliceRandom;
use rand::Rng;

use crate::auth::repo_types::UserSummary;
use crate::error::{ApiError, FieldErrors};

/// List-name rules: required, 2-100 characters, unique. Uniqueness is
/// resolved by the caller against the store and passed in.
pub fn validate_list_name(name: Option<&str>, taken: bool) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match name {
        None => errors.add("list_name", "The list name field is required"),
        Some(name) if name.is_empty() => {
            errors.add("list_name", "The list name field is required")
        }
        Some(name) => {
            if name.len() < 2 || name.len() > 100 {
                errors.add(
                    "list_name",
                    "The list name must be between 2 and 100 characters",
                );
            }
            if taken {
                errors.add("list_name", "The list name has already been taken");
            }
        }
    }
    errors
}

/// Draw one member uniformly at random. Lists with fewer than two members
/// cannot produce a draw: an empty list has nobody to pick, and a
/// single-member list is excluded by product rule.
pub fn pick_uniform<'a, R: Rng>(
    rng: &mut R,
    members: &'a [UserSummary],
) -> Result<&'a UserSummary, ApiError> {
    match members.len() {
        0 => Err(ApiError::Unprocessable(
            "No users in this list to pick a winner from".to_string(),
        )),
        1 => Err(ApiError::Unprocessable(
            "Cannot generate a random winner with only 1 user".to_string(),
        )),
        _ => Ok(members.choose(rng).expect("non-empty slice")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn summary(n: usize) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            first_name: format!("User{n}"),
            last_name: "Test".into(),
            email: format!("user{n}@example.com"),
        }
    }

    #[test]
    fn name_required() {
        assert!(!validate_list_name(None, false).is_empty());
        assert!(!validate_list_name(Some(""), false).is_empty());
    }

    #[test]
    fn name_length_bounds() {
        assert!(!validate_list_name(Some("a"), false).is_empty());
        assert!(validate_list_name(Some("ab"), false).is_empty());
        assert!(validate_list_name(Some(&"x".repeat(100)), false).is_empty());
        assert!(!validate_list_name(Some(&"x".repeat(101)), false).is_empty());
    }

    #[test]
    fn duplicate_name_rejected() {
        let errors = validate_list_name(Some("Class of 2026"), true);
        assert_eq!(
            errors.0["list_name"],
            vec!["The list name has already been taken".to_string()]
        );
    }

    #[test]
    fn empty_list_cannot_draw() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = pick_uniform(&mut rng, &[]).unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(_)));
    }

    #[test]
    fn single_member_cannot_draw() {
        let mut rng = StdRng::seed_from_u64(7);
        let members = vec![summary(0)];
        let err = pick_uniform(&mut rng, &members).unwrap_err();
        assert!(err.to_string().contains("only 1 user"));
    }

    #[test]
    fn two_members_can_draw() {
        let mut rng = StdRng::seed_from_u64(7);
        let members = vec![summary(0), summary(1)];
        let winner = pick_uniform(&mut rng, &members).unwrap();
        assert!(members.contains(winner));
    }

    #[test]
    fn draw_is_uniform_over_members() {
        let members: Vec<UserSummary> = (0..4).map(summary).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;

        let mut counts = vec![0usize; members.len()];
        for _ in 0..trials {
            let winner = pick_uniform(&mut rng, &members).unwrap();
            let idx = members.iter().position(|m| m.id == winner.id).unwrap();
            counts[idx] += 1;
        }

        let expected = trials as f64 / members.len() as f64;
        for count in counts {
            let deviation = (count as f64 - expected).abs() / trials as f64;
            assert!(deviation < 0.03, "deviation {deviation} exceeds 3%");
        }
    }
}
