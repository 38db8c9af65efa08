use crate::{Permission, PermissionSet, VeilPermissionError};

/// Parses a CRUD shorthand declared for `role`.
///
/// A shorthand is an in-order subsequence of `CRUD`: each present character
/// grants the matching permission, and the empty string grants nothing.
/// Characters outside the alphabet, repeats and out-of-order characters are
/// all rejected, naming the offending character and role.
///
/// ```rust
/// use veil_permissions::{Permission, parse_shorthand};
///
/// let set = parse_shorthand("User", "RU").unwrap();
/// assert_eq!(set.to_vec(), vec![Permission::Read, Permission::Update]);
///
/// assert!(parse_shorthand("User", "RX").is_err());
/// ```
pub fn parse_shorthand(role: &str, shorthand: &str) -> Result<PermissionSet, VeilPermissionError> {
    let mut set = PermissionSet::empty();
    let mut last: Option<Permission> = None;

    for character in shorthand.chars() {
        let reject = |reason| VeilPermissionError::Validation {
            role: role.to_string(),
            shorthand: shorthand.to_string(),
            character,
            reason,
        };

        let permission = Permission::from_symbol(character)
            .ok_or_else(|| reject("expected one of C, R, U or D but found"))?;

        match last {
            Some(previous) if previous == permission => {
                return Err(reject("repeated character"));
            }
            Some(previous) if previous > permission => {
                return Err(reject("characters must follow CRUD order but found"));
            }
            _ => {}
        }

        set.insert(permission);
        last = Some(permission);
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_the_full_shorthand() {
        let set = parse_shorthand("Admin", "CRUD").unwrap();
        assert_eq!(set.to_vec(), Permission::ALL.to_vec());
    }

    #[test]
    fn it_parses_the_empty_shorthand() {
        let set = parse_shorthand("Admin", "").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn it_parses_partial_shorthands() {
        assert_eq!(
            parse_shorthand("User", "RU").unwrap().to_vec(),
            vec![Permission::Read, Permission::Update]
        );
        assert_eq!(
            parse_shorthand("User", "CD").unwrap().to_vec(),
            vec![Permission::Create, Permission::Delete]
        );
        assert_eq!(
            parse_shorthand("User", "R").unwrap().to_vec(),
            vec![Permission::Read]
        );
    }

    #[test]
    fn it_rejects_characters_outside_the_alphabet() {
        let error = parse_shorthand("Editor", "RX").unwrap_err();
        assert!(matches!(
            error,
            VeilPermissionError::Validation { ref role, character: 'X', .. } if role == "Editor"
        ));
        assert!(error.to_string().contains("'X'"));
        assert!(error.to_string().contains("Editor"));
    }

    #[test]
    fn it_rejects_lowercase_characters() {
        let error = parse_shorthand("Editor", "r").unwrap_err();
        assert!(matches!(
            error,
            VeilPermissionError::Validation { character: 'r', .. }
        ));
    }

    #[test]
    fn it_rejects_repeats_and_disorder() {
        assert!(matches!(
            parse_shorthand("A", "RR"),
            Err(VeilPermissionError::Validation { character: 'R', .. })
        ));
        assert!(matches!(
            parse_shorthand("A", "UR"),
            Err(VeilPermissionError::Validation { character: 'R', .. })
        ));
    }
}
