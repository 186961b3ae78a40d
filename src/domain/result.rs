//! Result type alias for Datamove

use super::errors::DatamoveError;

/// Result type alias for Datamove operations
///
/// # Examples
///
/// ```
/// use datamove::domain::result::Result;
/// use datamove::domain::errors::DatamoveError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DatamoveError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DatamoveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(DatamoveError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
