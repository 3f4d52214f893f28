use single_utilities::traits::FloatOps;
use std::collections::HashMap;

pub mod correction;
pub mod effect;
pub mod inference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., U statistic, Wald z)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Effect size measurement
    pub effect_size: Option<T>,
    /// Standard error of the effect size or test statistic
    pub standard_error: Option<T>,
    /// Additional test-specific information
    pub metadata: HashMap<String, T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with effect size
    pub fn with_effect_size(statistic: T, p_value: T, effect_size: T) -> Self {
        TestResult {
            statistic,
            p_value,
            effect_size: Some(effect_size),
            standard_error: None,
            metadata: HashMap::new(),
        }
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: T) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: T) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// The p-value when it is a usable probability
    pub fn defined_p_value(&self) -> Option<T> {
        if num_traits::Float::is_finite(self.p_value) {
            Some(self.p_value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_defined_p_value() {
        let result = TestResult::with_effect_size(9.0f64, 0.1, 0.8)
            .with_standard_error(2.2)
            .with_metadata("exact", 1.0);
        assert_eq!(result.effect_size, Some(0.8));
        assert_eq!(result.standard_error, Some(2.2));
        assert_eq!(result.metadata.get("exact"), Some(&1.0));
        assert_eq!(result.defined_p_value(), Some(0.1));

        let undefined = TestResult::with_effect_size(0.0f64, f64::NAN, 0.0);
        assert_eq!(undefined.defined_p_value(), None);
    }
}
