//! Custom assertion macros and utilities
//!
//! Provides enhanced assertion macros for better test output and
//! more descriptive error messages.

/// Assert that a result is ok and return the value
///
/// This macro unwraps a Result, providing a better error message
/// if the result is an error.
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a result is an error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert the favorites view holds exactly `ids`
#[macro_export]
macro_rules! assert_favorites {
    ($coordinator:expr, [$($id:expr),* $(,)?]) => {
        let expected: ardelyoum::shared::FavoriteSet = [$($id),*].into_iter().collect();
        let actual = $coordinator.favorites().ids;
        assert_eq!(
            actual, expected,
            "Favorites mismatch: got {:?}, expected {:?}",
            actual.to_vec(),
            expected.to_vec()
        );
    };
}
