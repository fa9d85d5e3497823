use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Local,
    Development,
    Production,
}

impl Stage {
    /// Cookies only carry the `Secure` attribute outside local runs.
    pub fn secure_cookies(&self) -> bool {
        !matches!(self, Stage::Local)
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Stage::Local => "Local",
            Stage::Development => "Development",
            Stage::Production => "Production",
        };
        write!(f, "{}", stage)
    }
}

impl TryFrom<&String> for Stage {
    type Error = anyhow::Error;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Local" => Ok(Stage::Local),
            "Development" => Ok(Stage::Development),
            "Production" => Ok(Stage::Production),
            _ => Err(anyhow::anyhow!("Invalid stage: {}", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_stages() {
        assert_eq!(
            Stage::try_from(&"Production".to_string()).unwrap(),
            Stage::Production
        );
        assert!(Stage::try_from(&"prod".to_string()).is_err());
    }

    #[test]
    fn only_local_disables_secure_cookies() {
        assert!(!Stage::Local.secure_cookies());
        assert!(Stage::Development.secure_cookies());
        assert!(Stage::Production.secure_cookies());
    }
}
