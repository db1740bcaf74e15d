//! Cross-cutting router settings.
//!
//! A router carries one error formatter and one data transformer. Either may
//! be left at its default; composing routers picks the single non-default
//! value, if any, through [`reconcile`].

pub mod formatter;
pub mod transformer;

use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::ComposeError;

/// Which cross-cutting setting is being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    ErrorFormatter,
    Transformer,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingKind::ErrorFormatter => f.write_str("error formatter"),
            SettingKind::Transformer => f.write_str("transformer"),
        }
    }
}

/// A setting that is either left at the framework default or overridden.
///
/// Overrides are compared by identity: two `Custom` values are the same
/// setting only if they share one allocation.
pub enum Setting<T: ?Sized> {
    Default,
    Custom(Arc<T>),
}

impl<T: ?Sized> Setting<T> {
    pub fn custom(value: Arc<T>) -> Self {
        Setting::Custom(value)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Setting::Default)
    }

    pub fn as_custom(&self) -> Option<&Arc<T>> {
        match self {
            Setting::Default => None,
            Setting::Custom(value) => Some(value),
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Setting::Default, Setting::Default) => true,
            (Setting::Custom(a), Setting::Custom(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// The override, or `default` when unset.
    pub fn get_or<'a>(&'a self, default: &'a T) -> &'a T {
        match self {
            Setting::Default => default,
            Setting::Custom(value) => value,
        }
    }
}

impl<T: ?Sized> Clone for Setting<T> {
    fn clone(&self) -> Self {
        match self {
            Setting::Default => Setting::Default,
            Setting::Custom(value) => Setting::Custom(Arc::clone(value)),
        }
    }
}

impl<T: ?Sized> Default for Setting<T> {
    fn default() -> Self {
        Setting::Default
    }
}

impl<T: ?Sized> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Default => f.write_str("Default"),
            Setting::Custom(value) => f
                .debug_tuple("Custom")
                .field(&Arc::as_ptr(value).cast::<()>())
                .finish(),
        }
    }
}

/// Pick the single effective value of a setting across routers.
///
/// Walks `settings` in order. Defaults are skipped, the first override is
/// adopted, and any later override that is not the same value fails with
/// [`ComposeError::ConflictingConfiguration`].
pub fn reconcile<'a, T>(
    kind: SettingKind,
    settings: impl IntoIterator<Item = &'a Setting<T>>,
) -> Result<Setting<T>, ComposeError>
where
    T: ?Sized + 'a,
{
    settings
        .into_iter()
        .try_fold(Setting::Default, |winner, next| match (winner, next) {
            (winner, Setting::Default) => Ok(winner),
            (Setting::Default, next) => Ok(next.clone()),
            (winner, next) if winner.same_as(next) => Ok(winner),
            _ => {
                warn!(setting = %kind, "Routers declare different values for one setting");
                Err(ComposeError::ConflictingConfiguration { setting: kind })
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(value: u32) -> Setting<u32> {
        Setting::custom(Arc::new(value))
    }

    #[test]
    fn test_all_default() {
        let settings = [Setting::<u32>::Default, Setting::Default];
        let result = reconcile(SettingKind::Transformer, &settings).unwrap();
        assert!(result.is_default());
    }

    #[test]
    fn test_empty_is_default() {
        let settings: [Setting<u32>; 0] = [];
        let result = reconcile(SettingKind::Transformer, &settings).unwrap();
        assert!(result.is_default());
    }

    #[test]
    fn test_single_override_wins() {
        let t = custom(7);
        let settings = [Setting::Default, t.clone(), Setting::Default];
        let result = reconcile(SettingKind::Transformer, &settings).unwrap();
        assert!(result.same_as(&t));
    }

    #[test]
    fn test_same_override_is_not_a_conflict() {
        let f = custom(1);
        let settings = [f.clone(), Setting::Default, f.clone()];
        let result = reconcile(SettingKind::ErrorFormatter, &settings).unwrap();
        assert!(result.same_as(&f));
    }

    #[test]
    fn test_equal_values_different_identity_conflict() {
        // equal contents, separate allocations
        let settings = [custom(1), custom(1)];
        let result = reconcile(SettingKind::ErrorFormatter, &settings);
        assert_eq!(
            result.unwrap_err(),
            ComposeError::ConflictingConfiguration {
                setting: SettingKind::ErrorFormatter
            }
        );
    }

    #[test]
    fn test_conflict_names_setting() {
        let settings = [custom(1), Setting::Default, custom(2)];
        let err = reconcile(SettingKind::Transformer, &settings).unwrap_err();
        assert_eq!(err.to_string(), "you seem to have several transformers");
    }

    #[test]
    fn test_same_as() {
        let a = custom(3);
        assert!(a.same_as(&a.clone()));
        assert!(Setting::<u32>::Default.same_as(&Setting::Default));
        assert!(!a.same_as(&Setting::Default));
        assert_eq!(*a.get_or(&0), 3);
        assert_eq!(*Setting::Default.get_or(&0), 0);
    }
}
