#![forbid(unsafe_code)]

pub mod stats;

pub mod ids {
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct JobId(String);

    impl JobId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, JobIdError> {
            let value = value.into();
            validate_job_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum JobIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    fn validate_job_id(value: &str) -> Result<(), JobIdError> {
        if value.is_empty() {
            return Err(JobIdError::Empty);
        }
        if value.len() > 128 {
            return Err(JobIdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(JobIdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(JobIdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | ':') {
                continue;
            }
            return Err(JobIdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    /// Country codes are stored verbatim (no case normalization): the raw
    /// record store is the authority on how a country is spelled.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct CountryCode(String);

    impl CountryCode {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, CountryCodeError> {
            let value = value.into();
            validate_country_code(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum CountryCodeError {
        Empty,
        TooLong,
        InvalidChar { ch: char, index: usize },
    }

    fn validate_country_code(value: &str) -> Result<(), CountryCodeError> {
        if value.is_empty() {
            return Err(CountryCodeError::Empty);
        }
        if value.len() > 16 {
            return Err(CountryCodeError::TooLong);
        }
        for (index, ch) in value.chars().enumerate() {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                continue;
            }
            return Err(CountryCodeError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn job_id_accepts_slug_and_uuid_shapes() {
            assert!(JobId::try_new("sw-eng").is_ok());
            assert!(JobId::try_new("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
            assert!(JobId::try_new("jobs:backend_2").is_ok());
        }

        #[test]
        fn job_id_rejects_bad_input() {
            assert_eq!(JobId::try_new(""), Err(JobIdError::Empty));
            assert_eq!(JobId::try_new("-lead"), Err(JobIdError::InvalidFirstChar));
            assert_eq!(
                JobId::try_new("a b"),
                Err(JobIdError::InvalidChar { ch: ' ', index: 1 })
            );
            assert_eq!(JobId::try_new("x".repeat(129)), Err(JobIdError::TooLong));
        }

        #[test]
        fn country_code_rejects_bad_input() {
            assert!(CountryCode::try_new("US").is_ok());
            assert!(CountryCode::try_new("GB-SCT").is_ok());
            assert_eq!(CountryCode::try_new(""), Err(CountryCodeError::Empty));
            assert_eq!(
                CountryCode::try_new("U S"),
                Err(CountryCodeError::InvalidChar { ch: ' ', index: 1 })
            );
        }
    }
}
