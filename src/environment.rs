use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// bcrypt work factor for this environment.
    ///
    /// Tests hash fixture passwords and the trusted client secret on every
    /// setup, so they run with the minimum cost bcrypt accepts.
    #[must_use]
    pub const fn bcrypt_cost(self) -> u32 {
        match self {
            Self::Test => 4,
            Self::Development | Self::Production => bcrypt::DEFAULT_COST,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn parses_snake_case_names() {
        assert_eq!(Environment::from_str("test").unwrap(), Environment::Test);
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn test_environment_uses_cheap_bcrypt_cost() {
        assert_eq!(Environment::Test.bcrypt_cost(), 4);
        assert_eq!(Environment::Production.bcrypt_cost(), bcrypt::DEFAULT_COST);
    }
}
