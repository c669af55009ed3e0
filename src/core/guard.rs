//! Guard predicates and callback types.
//!
//! Guards decide whether a transition fires. Callbacks are the user code the
//! engine runs on entry, exit, and transition actions.

use std::error::Error;
use std::fmt;

/// Error raised by a user callback. The engine returns it unmodified.
pub type CallbackError = Box<dyn Error + Send + Sync>;

/// Result type returned by every user callback.
pub type CallbackResult = Result<(), CallbackError>;

/// Entry, exit, and transition action callback.
pub type Callback<D> = Box<dyn FnMut(&D) -> CallbackResult + Send>;

/// Predicate gating whether a transition fires.
///
/// Guards should be deterministic and free of side effects; anything with
/// side effects belongs in a transition action.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Guard;
///
/// let is_positive = Guard::new(|n: &i32| *n > 0);
///
/// assert!(is_positive.check(&3));
/// assert!(!is_positive.check(&-1));
/// ```
pub struct Guard<D> {
    predicate: Box<dyn Fn(&D) -> bool + Send + Sync>,
}

impl<D> Guard<D> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Evaluate the predicate against the trigger payload.
    pub fn check(&self, data: &D) -> bool {
        (self.predicate)(data)
    }
}

impl<D> fmt::Debug for Guard<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}

/// Box a closure as a [`Callback`].
pub fn callback<D, F>(f: F) -> Callback<D>
where
    F: FnMut(&D) -> CallbackResult + Send + 'static,
{
    Box::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Order {
        paid: bool,
        items: usize,
    }

    #[test]
    fn guard_checks_payload() {
        let guard = Guard::new(|o: &Order| o.paid);

        assert!(guard.check(&Order {
            paid: true,
            items: 1
        }));
        assert!(!guard.check(&Order {
            paid: false,
            items: 1
        }));
    }

    #[test]
    fn guard_is_deterministic() {
        let order = Order {
            paid: true,
            items: 0,
        };
        let guard = Guard::new(|o: &Order| o.paid && o.items > 0);

        assert_eq!(guard.check(&order), guard.check(&order));
        assert!(!guard.check(&order));
    }

    #[test]
    fn callback_propagates_its_error() {
        let mut cb = callback(|n: &u8| {
            if *n == 0 {
                Err("zero".into())
            } else {
                Ok(())
            }
        });

        assert!(cb(&1).is_ok());
        let err = cb(&0).unwrap_err();
        assert_eq!(err.to_string(), "zero");
    }
}
