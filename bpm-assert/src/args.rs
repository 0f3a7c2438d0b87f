//! Caller-supplied name lists (message names, activity ids, variable names).
//!
//! Assertions take their expected names through [`IntoNames`], which accepts
//! the shapes a test naturally writes (a single `&str`, arrays, slices,
//! vectors) and also the "absent" shapes: `None` for the whole list and
//! `None` entries inside it. Absent values are rejected as caller misuse
//! before the engine is queried.

/// A single name inside a list. `None`-like items represent an absent name.
pub trait NameItem {
    fn into_name(self) -> Option<String>;
}

impl NameItem for &str {
    fn into_name(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl NameItem for String {
    fn into_name(self) -> Option<String> {
        Some(self)
    }
}

impl NameItem for &String {
    fn into_name(self) -> Option<String> {
        Some(self.clone())
    }
}

impl NameItem for Option<&str> {
    fn into_name(self) -> Option<String> {
        self.map(str::to_string)
    }
}

impl NameItem for Option<String> {
    fn into_name(self) -> Option<String> {
        self
    }
}

/// Converts an argument into a list of possibly-absent names.
///
/// Returns `None` when the list itself is absent.
pub trait IntoNames {
    fn into_names(self) -> Option<Vec<Option<String>>>;
}

impl IntoNames for &str {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        Some(vec![Some(self.to_string())])
    }
}

impl IntoNames for String {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        Some(vec![Some(self)])
    }
}

impl<I: NameItem> IntoNames for Vec<I> {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        Some(self.into_iter().map(NameItem::into_name).collect())
    }
}

impl<I: NameItem, const N: usize> IntoNames for [I; N] {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        Some(self.into_iter().map(NameItem::into_name).collect())
    }
}

impl<I: NameItem + Clone> IntoNames for &[I] {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        Some(self.iter().cloned().map(NameItem::into_name).collect())
    }
}

impl<I: NameItem + Clone> IntoNames for &Vec<I> {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        self.as_slice().into_names()
    }
}

impl<I: NameItem + Clone, const N: usize> IntoNames for &[I; N] {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        self.as_slice().into_names()
    }
}

impl<T: IntoNames> IntoNames for Option<T> {
    fn into_names(self) -> Option<Vec<Option<String>>> {
        self.and_then(IntoNames::into_names)
    }
}

/// Validates a name list: it must be present, non-empty and free of absent entries.
///
/// `what` names the argument in the error message, e.g. `"messageNames"`.
pub(crate) fn require_names(names: impl IntoNames, what: &str) -> crate::Result<Vec<String>> {
    let raw = names.into_names();
    let invalid = || {
        crate::Error::illegal_argument(format!(
            "Expecting list of {what} not to be null, not to be empty and not to contain null values: {}.",
            describe(raw.as_deref())
        ))
    };
    let Some(list) = raw.as_ref() else {
        return Err(invalid());
    };
    if list.is_empty() || list.iter().any(Option::is_none) {
        return Err(invalid());
    }
    Ok(list.iter().flatten().cloned().collect())
}

/// Like [`require_names`] but an empty list is allowed.
pub(crate) fn optional_names(names: impl IntoNames, what: &str) -> crate::Result<Vec<String>> {
    let raw = names.into_names();
    match raw.as_deref() {
        Some(list) if list.iter().all(Option::is_some) => {
            Ok(list.iter().flatten().cloned().collect())
        }
        other => Err(crate::Error::illegal_argument(format!(
            "Expecting list of {what} not to be null and not to contain null values: {}.",
            describe(other)
        ))),
    }
}

fn describe(list: Option<&[Option<String>]>) -> String {
    match list {
        None => "null".to_string(),
        Some(list) => {
            let items: Vec<&str> = list.iter().map(|n| n.as_deref().unwrap_or("null")).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn single_str_is_one_name() {
        assert_eq!(require_names("myMessage", "messageNames").unwrap(), ["myMessage"]);
    }

    #[test]
    fn arrays_slices_and_vecs_keep_order() {
        let expected = vec!["a".to_string(), "b".to_string()];
        assert_eq!(require_names(["a", "b"], "x").unwrap(), expected);
        assert_eq!(require_names(&["a", "b"][..], "x").unwrap(), expected);
        assert_eq!(require_names(vec!["a".to_string(), "b".to_string()], "x").unwrap(), expected);
        assert_eq!(require_names([Some("a"), Some("b")], "x").unwrap(), expected);
    }

    #[test]
    fn borrowed_vecs_and_arrays_are_accepted() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(require_names(&names, "x").unwrap(), names);

        let array = ["a", "b"];
        assert_eq!(require_names(&array, "x").unwrap(), names);

        let with_gap = vec![Some("a".to_string()), None];
        assert!(require_names(&with_gap, "x").unwrap_err().is_illegal_argument());
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = require_names(Vec::<&str>::new(), "messageNames").unwrap_err();
        assert_eq!(
            err,
            Error::IllegalArgument(
                "Expecting list of messageNames not to be null, not to be empty and not to contain null values: [].".into()
            )
        );
    }

    #[test]
    fn absent_list_is_rejected() {
        let err = require_names(None::<Vec<&str>>, "messageNames").unwrap_err();
        assert!(err.is_illegal_argument());
        assert!(err.to_string().ends_with(": null."));
    }

    #[test]
    fn absent_entry_is_rejected() {
        let err = require_names([Some("myMessage"), None], "messageNames").unwrap_err();
        assert!(err.is_illegal_argument());
        assert!(err.to_string().ends_with(": [myMessage, null]."));
    }

    #[test]
    fn optional_names_accepts_empty_but_not_absent() {
        assert!(optional_names(Vec::<&str>::new(), "variableNames").unwrap().is_empty());
        assert!(optional_names(None::<&str>, "variableNames").is_err());
        assert!(optional_names([None::<&str>], "variableNames").is_err());
    }
}
